// (c) 2026 the fctw developers, licensed under GPL-3.0

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs, fs::File};

use rayon::prelude::*;

use fctw::entropy_coding::{ACReader, ACWriter, ArithmeticCoder};
use fctw::models::{Ctw, Fctw, Model, Vom};
use fctw::{unroll_collect, unroll_for};

const DEFAULT_DEPTH: usize = 56;
const BLOCK_LEN: usize = 8;

#[derive(Clone, Copy)]
enum Action {
    Compress,
    Decompress,
    Test,
    Train,
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        print_usage_and_panic("Invocation doesn't match usage! Provide 2 or 3 arguments.");
    }
    let action = match args[1].as_str() {
        "c" => Action::Compress,
        "d" => Action::Decompress,
        "t" => Action::Test,
        "m" => Action::Train,
        _ => {
            print_usage_and_panic("Unrecognized option -> <action>!");
            unreachable!();
        }
    };
    let path = PathBuf::from(&args[2]);
    let depth = match args.get(3) {
        Some(arg) => arg.parse().expect("<depth> must be a positive number"),
        None => DEFAULT_DEPTH,
    };

    if path.is_dir() {
        // files are independent models, run them in parallel
        let mut files = Vec::new();
        for file in fs::read_dir(path)? {
            let file_path = file?.path();
            if file_path.is_file() {
                files.push(file_path);
            }
        }
        files
            .par_iter()
            .try_for_each(|file_path| run(file_path, action, depth))?;
    } else if path.is_file() {
        run(&path, action, depth)?;
    } else {
        panic!("Path must be a file or a directory!");
    }

    Ok(())
}

fn run(file_path: &Path, action: Action, depth: usize) -> io::Result<()> {
    let mut out_path = env::current_dir()?;
    out_path.push(file_path.file_name().expect("Invalid file!"));

    let compress_path = out_path.with_extension("fctw");
    let decompress_path = out_path.with_extension("orig");
    let model_path = out_path.with_extension("json");

    let timer = Instant::now();
    match action {
        Action::Compress => {
            compress(file_path, &compress_path, depth)?;
            println!("Compression took: {:?}", timer.elapsed());
        }
        Action::Decompress => {
            decompress(file_path, &decompress_path, depth)?;
            println!("Decompression took: {:?}", timer.elapsed());
        }
        Action::Test => {
            compress(file_path, &compress_path, depth)?;
            println!("Compression took: {:?}", timer.elapsed());
            let timer = Instant::now();
            decompress(&compress_path, &decompress_path, depth)?;
            println!("Decompression took: {:?}", timer.elapsed());
        }
        Action::Train => {
            train(file_path, &model_path, depth)?;
            println!("Training took: {:?}", timer.elapsed());
        }
    }

    Ok(())
}

fn new_model(depth: usize) -> Fctw {
    Fctw::new(BLOCK_LEN, &vec![0; depth])
}

/// Stream format: 8-byte LE length of the original, then the coded bits.
fn compress(input: &Path, output: &Path, depth: usize) -> io::Result<()> {
    let len = fs::metadata(input)?.len();
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&len.to_le_bytes())?;

    let mut model = new_model(depth);
    let mut ac = ArithmeticCoder::new_coder(ACWriter::new(writer));

    for byte_res in reader.bytes() {
        let byte = byte_res?;
        unroll_for!(bit in byte, {
            let p0 = model.prob0();
            ac.encode(bit, p0)?;
            model.observe(bit);
        });
    }

    ac.flush()
}

fn decompress(input: &Path, output: &Path, depth: usize) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut len_bytes = [0u8; 8];
    reader.read_exact(&mut len_bytes)?;
    let len = u64::from_le_bytes(len_bytes);

    let mut writer = BufWriter::new(File::create(output)?);
    let mut model = new_model(depth);
    let mut ac = ArithmeticCoder::new_decoder(ACReader::new(reader))?;

    for _ in 0..len {
        unroll_collect!(bit into byte, {
            let p0 = model.prob0();
            bit = ac.decode(p0)?;
            model.observe(bit);
        });
        writer.write_all(&[byte])?;
    }

    writer.flush()
}

/// Trains a plain CTW over the file and dumps the maximized VOM as JSON.
fn train(input: &Path, output: &Path, depth: usize) -> io::Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut model = Ctw::new(&vec![0; depth]);

    for byte_res in reader.bytes() {
        let byte = byte_res?;
        unroll_for!(bit in byte, {
            model.observe(bit);
        });
    }

    let writer = BufWriter::new(File::create(output)?);
    serde_json::to_writer(writer, &Vom::from_ctw(&model))?;
    Ok(())
}

fn print_usage_and_panic(panic_msg: &str) {
    println!("Usage: fctw <Action> <Path> [Depth]");
    println!("<Action> [single file]: c (compress), d (decompress), t (test = c + d), m (train a model)");
    println!("<Path> can be a single file or a directory");
    println!("<Depth> is the context tree depth, default {DEFAULT_DEPTH}");
    println!("Note: Directories are shallow traversed");
    panic!("{panic_msg}");
}
