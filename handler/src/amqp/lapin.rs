use futures::StreamExt;
use lapin::{
    options::{BasicConsumeOptions, QueueDeclareOptions},
    types::FieldTable,
    Connection, ConnectionProperties,
};
use tokio::sync::mpsc;

pub(crate) struct LapinConsumer {
    queue: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl LapinConsumer {
    pub(crate) async fn recv(&mut self) -> Option<Vec<u8>> {
        self.queue.recv().await
    }
}

/// Connects to RabbitMQ and starts forwarding deliveries from `queue`.
pub(crate) async fn create(addr: &str, queue: &str) -> Result<LapinConsumer, lapin::Error> {
    let options = ConnectionProperties::default()
        .with_executor(tokio_executor_trait::Tokio::current())
        .with_reactor(tokio_reactor_trait::Tokio);
    let conn = Connection::connect(addr, options).await?;
    let chan = conn.create_channel().await?;

    chan.queue_declare(
        queue,
        QueueDeclareOptions {
            durable: true,
            ..Default::default()
        },
        FieldTable::default(),
    )
    .await?;
    let mut consumer = chan
        .basic_consume(
            queue,
            "freesmiley-handler",
            BasicConsumeOptions {
                no_ack: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    let (send, recv) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        // keeps the connection alive for as long as the consumer runs
        let _conn = conn;

        while let Some(delivery) = consumer.next().await {
            let message = match delivery {
                Ok(delivery) => delivery.data,
                Err(err) => {
                    tracing::error!("error receiving message: {}", err);
                    continue;
                }
            };

            if send.send(message).is_err() {
                tracing::warn!("handler stopped listening, closing consumer");
                break;
            }
        }
    });

    Ok(LapinConsumer { queue: recv })
}
