use fastmm::{
    write_body, CscFormatter, Dense2dFormatter, DenseVectorFormatter, Formatter, TripletFormatter,
    WriteOptions,
};

fn render_all<F: Formatter>(formatter: &mut F, options: &WriteOptions) -> anyhow::Result<String> {
    let mut out = Vec::new();
    write_body(&mut out, formatter, options)?;
    Ok(String::from_utf8(out)?)
}

fn with_chunk_size(chunk_size_values: usize) -> WriteOptions {
    WriteOptions {
        chunk_size_values,
        num_threads: 1,
        ..WriteOptions::default()
    }
}

#[test]
fn csc_emits_one_based_coordinate_lines() -> anyhow::Result<()> {
    // 2x2: column 0 holds rows 0,1; column 1 holds row 0
    let indptr = vec![0usize, 2, 3];
    let indices = vec![0u64, 1, 0];
    let values = vec![10i64, 20, 30];
    let mut f = CscFormatter::new(&indptr, &indices, &values, false)?;
    let text = render_all(&mut f, &WriteOptions::default())?;
    assert_eq!(text, "1 1 10\n2 1 20\n1 2 30\n");
    Ok(())
}

#[test]
fn csc_transpose_equals_formatting_the_transposed_matrix() -> anyhow::Result<()> {
    // A (3x2):            A^T in CSC is A in CSR
    //   col0: rows 0,2    values 1.0, 2.0
    //   col1: rows 1,2    values 3.0, 4.0
    let indptr = vec![0u32, 2, 4];
    let indices = vec![0u32, 2, 1, 2];
    let values = vec![1.0f64, 2.0, 3.0, 4.0];

    let mut transposed = CscFormatter::new(&indptr, &indices, &values, true)?;
    let transposed_text = render_all(&mut transposed, &WriteOptions::default())?;

    // the same structure read as CSC of the 2x3 transpose, emitted directly:
    // entry (col, row) of A becomes (row, col) of A^T
    let mut direct = CscFormatter::new(&indptr, &indices, &values, false)?;
    let direct_text = render_all(&mut direct, &WriteOptions::default())?;
    let swapped: String = direct_text
        .lines()
        .map(|line| {
            let mut it = line.split_ascii_whitespace();
            let r = it.next().unwrap();
            let c = it.next().unwrap();
            let rest: Vec<&str> = it.collect();
            let mut line = format!("{c} {r}");
            for tok in rest {
                line.push(' ');
                line.push_str(tok);
            }
            line.push('\n');
            line
        })
        .collect();
    assert_eq!(transposed_text, swapped);

    // and the emitted entries are exactly those of the explicit transpose
    // A^T (2x3) in CSC: col0 holds row 0, col1 holds row 1, col2 holds rows 0,1
    let t_indptr = vec![0u32, 1, 2, 4];
    let t_indices = vec![0u32, 1, 0, 1];
    let t_values = vec![1.0f64, 3.0, 2.0, 4.0];
    let mut explicit = CscFormatter::new(&t_indptr, &t_indices, &t_values, false)?;
    let explicit_text = render_all(&mut explicit, &WriteOptions::default())?;
    let sorted = |text: &str| {
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();
        lines.join("\n")
    };
    assert_eq!(sorted(&transposed_text), sorted(&explicit_text));
    Ok(())
}

#[test]
fn chunk_size_never_changes_the_bytes() -> anyhow::Result<()> {
    let rows: Vec<u64> = (0..250).map(|k| k % 50).collect();
    let cols: Vec<u64> = (0..250).map(|k| k / 50).collect();
    let values: Vec<f64> = (0..250).map(|k| k as f64 * 0.25 - 3.0).collect();

    let mut reference = None;
    for chunk_size in [1usize, 3, 17, 250, 100_000] {
        let mut f = TripletFormatter::new(&rows, &cols, &values)?;
        let text = render_all(&mut f, &with_chunk_size(chunk_size))?;
        match &reference {
            None => reference = Some(text),
            Some(expect) => assert_eq!(&text, expect, "chunk_size_values = {chunk_size}"),
        }
    }

    // same law for the CSC and dense formatters
    let indptr = vec![0usize, 2, 2, 5, 6];
    let indices = vec![0u64, 3, 1, 2, 3, 0];
    let vals = vec![1i64, 2, 3, 4, 5, 6];
    let mut reference = None;
    for chunk_size in [1usize, 2, 1000] {
        let mut f = CscFormatter::new(&indptr, &indices, &vals, false)?;
        let text = render_all(&mut f, &with_chunk_size(chunk_size))?;
        match &reference {
            None => reference = Some(text),
            Some(expect) => assert_eq!(&text, expect),
        }
    }

    let dense = |row: u64, col: u64| (row * 10 + col) as i64;
    let mut reference = None;
    for chunk_size in [1usize, 4, 64] {
        let mut f = Dense2dFormatter::new(&dense, 5, 7);
        let text = render_all(&mut f, &with_chunk_size(chunk_size))?;
        match &reference {
            None => reference = Some(text),
            Some(expect) => assert_eq!(&text, expect),
        }
    }
    Ok(())
}

#[test]
fn parallel_write_matches_sequential_bytes() -> anyhow::Result<()> {
    let rows: Vec<u64> = (0..5_000).map(|k| k % 100).collect();
    let cols: Vec<u64> = (0..5_000).map(|k| k / 100 % 50).collect();
    let values: Vec<i64> = (0..5_000).collect();

    let mut f = TripletFormatter::new(&rows, &cols, &values)?;
    let sequential = render_all(&mut f, &with_chunk_size(64))?;

    let mut f = TripletFormatter::new(&rows, &cols, &values)?;
    let mut out = Vec::new();
    fastmm::write_body_threads(
        &mut out,
        &mut f,
        &WriteOptions {
            chunk_size_values: 64,
            num_threads: 4,
            ..WriteOptions::default()
        },
    )?;
    assert_eq!(String::from_utf8(out)?, sequential);
    Ok(())
}

#[test]
fn dense_vector_formatter_writes_index_value_lines() -> anyhow::Result<()> {
    let indices = vec![0u64, 4, 9];
    let values = vec![0.5f64, -2.25, 4.0];
    let mut f = DenseVectorFormatter::new(&indices, &values)?;
    let text = render_all(&mut f, &WriteOptions::default())?;
    assert_eq!(text, "1 0.5\n5 -2.25\n10 4.0\n");
    Ok(())
}

#[test]
fn pattern_triplets_omit_the_value_column() -> anyhow::Result<()> {
    let rows = vec![0u64, 2];
    let cols = vec![0u64, 1];
    let mut f = TripletFormatter::<u64, f64>::new(&rows, &cols, &[])?;
    let text = render_all(&mut f, &WriteOptions::default())?;
    assert_eq!(text, "1 1\n3 2\n");
    Ok(())
}

#[test]
fn dense_2d_is_column_major() -> anyhow::Result<()> {
    // 2x3 with value 10*row + col
    let dense = |row: u64, col: u64| (row * 10 + col) as i64;
    let mut f = Dense2dFormatter::new(&dense, 2, 3);
    let text = render_all(&mut f, &WriteOptions::default())?;
    assert_eq!(text, "0\n10\n1\n11\n2\n12\n");
    Ok(())
}

#[test]
fn explicit_precision_applies_to_every_value() -> anyhow::Result<()> {
    let rows = vec![0u64];
    let cols = vec![0u64];
    let values = vec![0.5f64];
    let mut f = TripletFormatter::new(&rows, &cols, &values)?;
    let text = render_all(
        &mut f,
        &WriteOptions {
            precision: Some(4),
            num_threads: 1,
            ..WriteOptions::default()
        },
    )?;
    assert_eq!(text, "1 1 5.0000e-1\n");
    Ok(())
}

#[test]
fn mismatched_lengths_are_invalid_arguments() {
    let rows = vec![0u64, 1];
    let cols = vec![0u64];
    assert!(matches!(
        TripletFormatter::<u64, f64>::new(&rows, &cols, &[]),
        Err(fastmm::Error::InvalidArgument(_))
    ));

    let indptr = vec![0usize, 1, 3];
    let indices = vec![0u64];
    assert!(CscFormatter::<usize, u64, i64>::new(&indptr, &indices, &[], false).is_err());
}
