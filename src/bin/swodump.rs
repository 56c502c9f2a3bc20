use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use structopt::StructOpt;
use swo::{Decoder, DecoderOptions};

#[derive(StructOpt, Debug)]
#[structopt(
    about = "A decoder for the Manchester-coded ARM SWO trace protocol. Reads a raw capture stream (8 line sub-samples per byte, oldest in bit 0) and writes the recovered trace bytes to stdout. Report bugs and request features at <https://github.com/rust-embedded/swo>."
)]
struct Opt {
    #[structopt(
        long = "--ignore-eof",
        help = "Keep reading when the input hits EOF (e.g. a growing capture file or a named pipe)."
    )]
    ignore_eof: bool,

    #[structopt(
        long = "--counter-width",
        default_value = "16",
        help = "Pulse counter width in bits; bounds the longest measurable pulse."
    )]
    counter_width: u8,

    #[structopt(
        long = "--pulses",
        help = "Print the raw (count, level) pulses instead of decoding to bytes."
    )]
    pulses: bool,

    #[structopt(
        name = "FILE",
        parse(from_os_str),
        help = "Raw capture input file. Reads stdin when omitted."
    )]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    if !(3..=31).contains(&opt.counter_width) {
        bail!(
            "{} is not a valid counter width; valid widths are 3..=31.",
            opt.counter_width
        );
    }

    let reader: Box<dyn Read> = match opt.file {
        Some(path) => {
            Box::new(File::open(&path).with_context(|| format!("failed to open {:?}", path))?)
        }
        None => Box::new(io::stdin()),
    };
    let mut decoder = Decoder::new(
        reader,
        DecoderOptions {
            ignore_eof: opt.ignore_eof,
            counter_width: opt.counter_width,
        },
    );

    if opt.pulses {
        let mut it = decoder.pulses();

        loop {
            match it.next() {
                None => return Ok(()), // EOF
                Some(Err(e)) => return Err(e).context("Decoder error"),
                Some(Ok(pulse)) => println!("{} {}", pulse.count, pulse.level as u8),
            }
        }
    } else {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        let mut it = decoder.bytes();

        loop {
            match it.next() {
                None => return Ok(()), // EOF
                Some(Err(e)) => return Err(e).context("Decoder error"),
                Some(Ok(byte)) => stdout
                    .write_all(&[byte])
                    .context("failed to write to stdout")?,
            }
        }
    }
}
