//! Wire codec throughput benchmarks, grounded on `hdds`'s
//! `benches/throughput.rs` CDR encode/decode benchmark shape.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flowline::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};
use flowline::codec::fingerprint::{compose_record, compose_type, Fingerprint, SeenTypes};
use flowline::codec::varint;
use flowline::codec::{Decode, Encode};

#[derive(Debug, Clone, PartialEq)]
struct SensorReading {
    sensor_id: u32,
    temperature: f64,
    humidity: f64,
    label: String,
    samples: Vec<f32>,
}

impl Fingerprint for SensorReading {
    fn family_hash(base: u32, seen: &mut SeenTypes) -> u32 {
        compose_record(base, 0, 5, 0, |mut base| {
            base = compose_type::<u32>(base, seen);
            base = compose_type::<f64>(base, seen);
            base = compose_type::<f64>(base, seen);
            base = compose_type::<String>(base, seen);
            compose_type::<Vec<f32>>(base, seen)
        })
    }
}

impl Encode for SensorReading {
    fn encode(&self, enc: &mut dyn flowline::codec::Encoder) -> flowline::Result<()> {
        self.sensor_id.encode(enc)?;
        self.temperature.encode(enc)?;
        self.humidity.encode(enc)?;
        self.label.encode(enc)?;
        self.samples.encode(enc)
    }
}

impl Decode for SensorReading {
    fn decode(dec: &mut dyn flowline::codec::Decoder) -> flowline::Result<Self> {
        Ok(SensorReading {
            sensor_id: u32::decode(dec)?,
            temperature: f64::decode(dec)?,
            humidity: f64::decode(dec)?,
            label: String::decode(dec)?,
            samples: Vec::<f32>::decode(dec)?,
        })
    }
}

fn sample_reading() -> SensorReading {
    SensorReading {
        sensor_id: 42,
        temperature: 21.5,
        humidity: 55.2,
        label: "rack-3/shelf-7".to_string(),
        samples: (0..32).map(|i| i as f32 * 0.5).collect(),
    }
}

fn bench_record_encode(c: &mut Criterion) {
    let reading = sample_reading();
    let mut group = c.benchmark_group("record_encode");
    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::new("sensor_reading", "encode"), &reading, |b, reading| {
        b.iter(|| {
            let mut enc = LittleEndianEncoder::new();
            reading.encode(&mut enc).unwrap();
            black_box(enc.into_bytes())
        });
    });
    group.finish();
}

fn bench_record_decode(c: &mut Criterion) {
    let reading = sample_reading();
    let mut enc = LittleEndianEncoder::new();
    reading.encode(&mut enc).unwrap();
    let bytes = enc.into_bytes();

    let mut group = c.benchmark_group("record_decode");
    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::new("sensor_reading", "decode"), &bytes, |b, bytes| {
        b.iter(|| {
            let mut dec = LittleEndianDecoder::new(bytes);
            black_box(SensorReading::decode(&mut dec).unwrap())
        });
    });
    group.finish();
}

fn bench_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");
    for value in [7u64, 300, 1 << 20, 1 << 40] {
        group.bench_with_input(BenchmarkId::new("write", value), &value, |b, value| {
            b.iter(|| {
                let mut buf = Vec::new();
                varint::write_varint(&mut buf, black_box(*value));
                buf
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_record_encode, bench_record_decode, bench_varint);
criterion_main!(benches);
