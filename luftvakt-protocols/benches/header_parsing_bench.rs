#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use luftvakt_core::mac::MacAddr;
use luftvakt_protocols::builder::FrameBuilder;
use luftvakt_protocols::ieee80211::subtype;
use luftvakt_protocols::{fcs, HeaderParser, Ieee80211Parser};

const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
const STA: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);

fn benchmark_deauth_parsing(c: &mut Criterion) {
    let parser = Ieee80211Parser::new();
    let frame = FrameBuilder::management(subtype::DEAUTHENTICATION)
        .addr1(STA)
        .addr2(AP)
        .addr3(AP)
        .body(vec![0x07, 0x00])
        .build(0);

    c.bench_function("deauth_parsing", |b| {
        b.iter(|| {
            black_box(parser.parse(&frame)).unwrap();
        })
    });
}

fn benchmark_radiotap_beacon_with_fcs(c: &mut Criterion) {
    let parser = Ieee80211Parser::new();
    let frame = FrameBuilder::management(subtype::BEACON)
        .addr1(MacAddr::BROADCAST)
        .addr2(AP)
        .addr3(AP)
        .body(vec![0u8; 120])
        .with_fcs()
        .radiotap()
        .build(0);

    c.bench_function("radiotap_beacon_parse_and_verify", |b| {
        b.iter(|| {
            let header = parser.parse(&frame).unwrap();
            black_box(fcs::verify(&frame.data, &header)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_deauth_parsing,
    benchmark_radiotap_beacon_with_fcs
);
criterion_main!(benches);
