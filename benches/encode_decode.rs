use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use opack::{DictionaryElement, Reader, Result, Writer};

fn encode_accessory(writer: &mut Writer<'_>) -> Result<()> {
    writer.write_dictionary_begin()?;
    writer.write_string("name")?;
    writer.write_string("Living Room Lamp")?;
    writer.write_string("brightness")?;
    writer.write_int(75)?;
    writer.write_string("hue")?;
    writer.write_float(212.5)?;
    writer.write_string("on")?;
    writer.write_bool(true)?;
    writer.write_string("token")?;
    writer.write_data(&[0xA5; 64])?;
    writer.write_string("history")?;
    writer.write_array_begin()?;
    for value in 0..16 {
        writer.write_int(value * 100)?;
    }
    writer.write_terminator()?;
    writer.write_terminator()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let size = opack::marshal(&(), |w, _| encode_accessory(w)).unwrap().len();
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("growable", |b| {
        let mut writer = Writer::with_capacity(size);
        b.iter(|| {
            writer.reset();
            encode_accessory(black_box(&mut writer)).unwrap();
        });
    });

    group.bench_function("fixed", |b| {
        let mut buffer = vec![0u8; size];
        b.iter(|| {
            let mut writer = Writer::fixed(&mut buffer);
            encode_accessory(black_box(&mut writer)).unwrap();
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let data = opack::marshal(&(), |w, _| encode_accessory(w)).unwrap();
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("skip", |b| {
        b.iter(|| {
            let mut reader = Reader::new(black_box(&data));
            reader.skip_next().unwrap();
        });
    });

    group.bench_function("string_dictionary", |b| {
        b.iter(|| {
            let mut elements = [
                DictionaryElement::keyed("name"),
                DictionaryElement::keyed("brightness"),
                DictionaryElement::keyed("history"),
                DictionaryElement::wildcard(),
            ];
            let mut reader = Reader::new(black_box(&data));
            reader.read_string_dictionary(&mut elements).unwrap();
            let mut history = elements[2].value().unwrap().read_array().unwrap();
            let mut total = 0;
            while history.has_more() {
                total += history.read_int().unwrap();
            }
            black_box(total);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
