//! Dump the first worksheet of an XLSX file page by page.
//!
//! ```bash
//! cargo run --example dump_sheet -- data.xlsx [page_size]
//! ```

use std::env;
use std::process;

use xlsxpager::{PageReader, DEFAULT_PAGE_SIZE};

fn main() {
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: dump_sheet <file.xlsx> [page_size]");
            process::exit(2);
        }
    };
    let page_size = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);

    if let Err(e) = run(&path, page_size) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(path: &str, page_size: usize) -> xlsxpager::Result<()> {
    let mut reader = PageReader::open(path, page_size)?;

    match reader.dimensions() {
        Some(dims) => println!(
            "{path}: rows {}..{}, columns {}..{}",
            dims.min_row, dims.max_row, dims.min_col, dims.max_col
        ),
        None => {
            println!("{path}: empty sheet");
            return Ok(());
        }
    }

    let mut total = 0usize;
    let mut page = 1;
    loop {
        let rows = reader.read(page)?;
        if rows.is_empty() {
            break;
        }
        for (i, row) in rows.iter().enumerate() {
            let line: Vec<&str> = row
                .iter()
                .map(|cell| cell.as_deref().unwrap_or(""))
                .collect();
            println!("{:>6} | {}", (page - 1) * page_size + i + 1, line.join("\t"));
        }
        total += rows.len();
        page += 1;
    }
    println!("{total} rows");
    Ok(())
}
