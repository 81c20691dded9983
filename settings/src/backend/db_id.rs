use std::fmt::Display;

use sqlx::{Encode, Postgres};
use twilight_model::id::Id;

/// Stores a twilight id in a `BIGINT` column.
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct DbId<T>(pub Id<T>);

impl<T> Display for DbId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> Copy for DbId<T> {}

impl<T> Clone for DbId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for DbId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl<T> Eq for DbId<T> {}

impl<T> Encode<'_, Postgres> for DbId<T> {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as sqlx::Database>::ArgumentBuffer<'_>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        Encode::<Postgres>::encode_by_ref(&i64::from(*self), buf)
    }
}

impl<T> sqlx::Type<Postgres> for DbId<T> {
    fn type_info() -> <Postgres as sqlx::Database>::TypeInfo {
        <i64 as sqlx::Type<Postgres>>::type_info()
    }
}

// discord ids fit in 63 bits, so the cast round-trips
impl<T> From<DbId<T>> for i64 {
    fn from(value: DbId<T>) -> Self {
        value.0.get() as Self
    }
}

#[cfg(test)]
mod tests {
    use twilight_model::id::marker::GuildMarker;

    use super::*;

    #[test]
    fn to_i64_test() {
        let id = DbId(Id::<GuildMarker>::new(466378653216014359));
        assert_eq!(i64::from(id), 466378653216014359);
        assert_eq!(id.to_string(), "466378653216014359");
    }
}
