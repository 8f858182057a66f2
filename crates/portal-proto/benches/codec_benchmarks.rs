use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use portal_proto::{Attribute, AttributeType, Message, MessageType, ProtocolVersion, verify_chap};
use std::net::Ipv4Addr;

fn create_test_message(version: ProtocolVersion, num_attributes: usize) -> Message {
    let mut message = Message::new(
        version,
        MessageType::AckInfo,
        0x6f3c,
        6,
        Ipv4Addr::new(192, 168, 10, 254),
    );

    for i in 0..num_attributes {
        let text = format!("attribute_{}", i);
        if let Ok(attr) = Attribute::string(AttributeType::TextInfo as u8, text) {
            message.add_attribute(attr).expect("Failed to add attribute");
        }
    }

    message.sign(&[0u8; 16], "testing123");
    message
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_encode");

    for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
        for num_attrs in [0, 5, 20] {
            group.bench_with_input(
                BenchmarkId::new(version.to_string(), num_attrs),
                &num_attrs,
                |b, &num_attrs| {
                    let message = create_test_message(version, num_attrs);
                    b.iter(|| black_box(&message).encode());
                },
            );
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_decode");

    for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
        let codec = version.codec();
        for num_attrs in [0, 5, 20] {
            let bytes = create_test_message(version, num_attrs).encode();
            group.bench_with_input(
                BenchmarkId::new(version.to_string(), num_attrs),
                &bytes,
                |b, bytes| {
                    b.iter(|| codec.decode(black_box(bytes)).expect("Failed to decode message"));
                },
            );
        }
    }

    group.finish();
}

fn bench_build_auth(c: &mut Criterion) {
    let challenge = [0x5au8; 16];
    let mut group = c.benchmark_group("build_chap_auth");

    for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
        let codec = version.codec();
        group.bench_function(version.to_string(), |b| {
            b.iter(|| {
                codec
                    .new_auth(
                        Ipv4Addr::new(192, 168, 56, 2),
                        "testing123",
                        black_box(1),
                        6,
                        b"alice",
                        b"password",
                        &challenge,
                    )
                    .expect("Failed to build auth request")
            });
        });
    }

    group.finish();
}

fn bench_verify_chap(c: &mut Criterion) {
    let challenge = [0x5au8; 16];
    let response = portal_proto::compute_chap_response(6, b"password", &challenge);

    c.bench_function("verify_chap", |b| {
        b.iter(|| verify_chap(6, b"password", black_box(&challenge), black_box(&response)));
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_build_auth,
    bench_verify_chap
);
criterion_main!(benches);
