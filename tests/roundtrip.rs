use std::io::{BufReader, Cursor};

use fastmm::{
    read_matrix_market_coo, write_matrix_market, Field, MatrixMarketHeader, Pattern, ReadOptions,
    TripletFormatter, WriteOptions,
};

fn seq_read() -> ReadOptions {
    ReadOptions {
        num_threads: 1,
        ..ReadOptions::default()
    }
}

fn seq_write() -> WriteOptions {
    WriteOptions {
        num_threads: 1,
        ..WriteOptions::default()
    }
}

#[test]
fn real_coordinate_round_trips_byte_for_byte() -> anyhow::Result<()> {
    let text = "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 2 3.5\n2 1 -1.0\n";
    let mut reader = text.as_bytes();
    let (header, (rows, cols, values)) =
        read_matrix_market_coo::<_, f64>(&mut reader, &seq_read())?;

    assert_eq!(rows, vec![0, 1]);
    assert_eq!(cols, vec![1, 0]);
    assert_eq!(values, vec![3.5, -1.0]);

    let mut out = Vec::new();
    let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
    write_matrix_market(&mut out, &header, &mut formatter, &seq_write())?;
    assert_eq!(String::from_utf8(out)?, text);
    Ok(())
}

#[test]
fn integer_coordinate_round_trips_byte_for_byte() -> anyhow::Result<()> {
    let text = "%%MatrixMarket matrix coordinate integer general\n3 3 3\n1 1 10\n2 3 -7\n3 2 0\n";
    let mut reader = text.as_bytes();
    let (header, (rows, cols, values)) =
        read_matrix_market_coo::<_, i64>(&mut reader, &seq_read())?;
    assert_eq!(values, vec![10, -7, 0]);

    let mut out = Vec::new();
    let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
    write_matrix_market(&mut out, &header, &mut formatter, &seq_write())?;
    assert_eq!(String::from_utf8(out)?, text);
    Ok(())
}

#[test]
fn floats_round_trip_bit_exact_through_a_file() -> anyhow::Result<()> {
    let values = vec![0.1f64, -3.75, 1e-300, 2.5e300, 1.0 / 3.0, -0.0];
    let rows: Vec<u64> = (0..values.len() as u64).collect();
    let cols = vec![0u64; values.len()];
    let header =
        MatrixMarketHeader::coordinate_matrix(values.len() as u64, 1, values.len() as u64, Field::Real);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("floats.mtx");
    let mut file = std::fs::File::create(&path)?;
    let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
    write_matrix_market(&mut file, &header, &mut formatter, &seq_write())?;

    let mut reader = BufReader::new(std::fs::File::open(&path)?);
    let (_, (_, _, back)) = read_matrix_market_coo::<_, f64>(&mut reader, &seq_read())?;
    assert_eq!(back.len(), values.len());
    for (a, b) in values.iter().zip(&back) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    Ok(())
}

#[test]
fn pattern_matrix_round_trips_without_values() -> anyhow::Result<()> {
    let text = "%%MatrixMarket matrix coordinate pattern general\n3 3 2\n1 1\n3 2\n";
    let mut reader = text.as_bytes();
    let (header, (rows, cols, values)) =
        read_matrix_market_coo::<_, Pattern>(&mut reader, &seq_read())?;
    assert_eq!(header.field, Field::Pattern);
    assert_eq!(rows, vec![0, 2]);
    assert_eq!(cols, vec![0, 1]);
    assert_eq!(values.len(), 2);

    // writing with an empty value slice omits the value column
    let mut out = Vec::new();
    let mut formatter = TripletFormatter::<u64, f64>::new(&rows, &cols, &[])?;
    write_matrix_market(&mut out, &header, &mut formatter, &seq_write())?;
    assert_eq!(String::from_utf8(out)?, text);
    Ok(())
}

#[test]
fn complex_values_round_trip() -> anyhow::Result<()> {
    let text = "%%MatrixMarket matrix coordinate complex general\n2 2 2\n1 1 1.5 -2.0\n2 2 0.0 3.25\n";
    let mut reader = text.as_bytes();
    let (header, (rows, cols, values)) =
        read_matrix_market_coo::<_, fastmm::Complex64>(&mut reader, &seq_read())?;
    assert_eq!(values[0], fastmm::Complex64::new(1.5, -2.0));

    let mut out = Vec::new();
    let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
    write_matrix_market(&mut out, &header, &mut formatter, &seq_write())?;
    assert_eq!(String::from_utf8(out)?, text);
    Ok(())
}

#[test]
fn comments_and_blank_lines_are_skipped_in_the_body() -> anyhow::Result<()> {
    let text = "%%MatrixMarket matrix coordinate integer general\n2 2 2\n% leading note\n1 1 5\n\n2 2 6\n";
    let mut reader = Cursor::new(text);
    let (_, (rows, _, values)) = read_matrix_market_coo::<_, i64>(&mut reader, &seq_read())?;
    assert_eq!(rows, vec![0, 1]);
    assert_eq!(values, vec![5, 6]);
    Ok(())
}

#[test]
fn header_comment_survives_a_round_trip() -> anyhow::Result<()> {
    let mut header = MatrixMarketHeader::coordinate_matrix(1, 1, 1, Field::Integer);
    header.comment = " generated for a test\n second line".to_string();
    let (rows, cols, values) = (vec![0u64], vec![0u64], vec![42i64]);

    let mut out = Vec::new();
    let mut formatter = TripletFormatter::new(&rows, &cols, &values)?;
    write_matrix_market(&mut out, &header, &mut formatter, &seq_write())?;

    let mut reader = out.as_slice();
    let (back, _) = read_matrix_market_coo::<_, i64>(&mut reader, &seq_read())?;
    assert_eq!(back.comment, header.comment);
    assert_eq!(back.header_line_count, 4);
    Ok(())
}
