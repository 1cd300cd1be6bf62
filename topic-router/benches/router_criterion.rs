use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use tokio::runtime::Builder;
use topic_router::{
    definition_of, delivery_targets, payload_key_table, FilterPolicy, Message, QueueDefinition,
    TopicBroker, PAYLOAD_V1_KEY_QUEUE,
};

const WIDE_TABLE_QUEUES: usize = 256;

fn router_criterion(c: &mut Criterion) {
    let payload_table = payload_key_table().expect("payload-key table should build");
    let wide_table = definition_of(
        "wide-topic",
        (0..WIDE_TABLE_QUEUES).map(|index| {
            QueueDefinition::new(format!("queue-{index}")).with_filter(
                FilterPolicy::numeric_allowlist("version", [index as f64, (index + 1) as f64]),
            )
        }),
    )
    .expect("wide table should build");

    let matched = Message::new("payload").with_attribute("version", 1);
    let unmatched = Message::new("payload").with_attribute("version", -1);

    let mut delivery_group = c.benchmark_group("delivery_targets");
    delivery_group.bench_function("payload_key_matched", |b| {
        b.iter(|| black_box(delivery_targets(black_box(&matched), &payload_table)));
    });
    delivery_group.bench_function("payload_key_unmatched", |b| {
        b.iter(|| black_box(delivery_targets(black_box(&unmatched), &payload_table)));
    });
    delivery_group.bench_function("wide_table_fan_out", |b| {
        b.iter(|| black_box(delivery_targets(black_box(&matched), &wide_table)));
    });
    delivery_group.finish();

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("benchmark runtime should build");

    let mut broker_group = c.benchmark_group("broker");
    broker_group.bench_function("publish_receive_delete", |b| {
        b.iter_batched(
            || TopicBroker::new("bench", payload_table.clone()),
            |broker| {
                runtime.block_on(async {
                    broker
                        .publish(matched.clone())
                        .await
                        .expect("publish should succeed");
                    let received = broker
                        .receive(PAYLOAD_V1_KEY_QUEUE, 1, Duration::from_secs(30))
                        .await
                        .expect("receive should succeed");
                    for entry in received {
                        broker
                            .delete(PAYLOAD_V1_KEY_QUEUE, entry.receipt_handle)
                            .await
                            .expect("delete should succeed");
                    }
                });
            },
            BatchSize::SmallInput,
        );
    });
    broker_group.finish();
}

criterion_group!(benches, router_criterion);
criterion_main!(benches);
