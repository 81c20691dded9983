mod lapin;

pub(crate) use lapin::create;
