// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use cocogen::{
    example_schema, group_captions, group_instances, group_person_keypoints, load_catalog,
    read_annotation_json, Error, ExampleGenerator, Variant,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde_json::json;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

/// Annotation kind of the input file.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Captions,
    Instances,
    PersonKeypoints,
}

impl From<Kind> for Variant {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Captions => Variant::Captions,
            Kind::Instances => Variant::Instances,
            Kind::PersonKeypoints => Variant::PersonKeypoints,
        }
    }
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Convert a COCO annotation file to JSON-Lines example records, one
    /// record per image. Records embed image payloads when --image-dir is
    /// given; otherwise only metadata is emitted.
    ///
    /// No segmentation codec is bundled with this tool, so converting
    /// instance annotations with non-empty segmentations fails with a
    /// codec-unavailable error; strip segmentations upstream or use the
    /// library with a codec implementation.
    Convert {
        /// Annotation kind contained in the file
        kind: Kind,

        /// Path to the COCO annotation JSON file
        annotations: PathBuf,

        /// Directory containing the image files referenced by file_name
        #[clap(long)]
        image_dir: Option<PathBuf>,

        /// Store dense masks instead of compressed RLE
        #[clap(long)]
        decode_rle: bool,

        /// Output file path, stdout if omitted
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the declared output field set for an annotation kind.
    Schema {
        /// Annotation kind
        kind: Kind,

        /// Describe the dense-mask segmentation representation
        #[clap(long)]
        decode_rle: bool,
    },
    /// Print dataset statistics for an annotation file.
    Info {
        /// Path to the COCO annotation JSON file
        annotations: PathBuf,
    },
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} images {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn convert(
    kind: Kind,
    annotations: PathBuf,
    image_dir: Option<PathBuf>,
    decode_rle: bool,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let file = read_annotation_json(&annotations)?;
    let images = load_catalog(&file.images)?;
    let licenses = load_catalog(&file.licenses)?;

    let mut writer: BufWriter<Box<dyn Write>> = match &output {
        Some(path) => BufWriter::new(Box::new(File::create(path)?)),
        None => BufWriter::new(Box::new(std::io::stdout())),
    };

    let mut generator = ExampleGenerator::new(&images);
    if !licenses.is_empty() {
        generator = generator.with_licenses(&licenses);
    }
    if let Some(dir) = &image_dir {
        generator = generator.with_image_dir(dir);
    }

    let bar = progress_bar(images.len() as u64);
    let mut count = 0usize;

    match kind {
        Kind::Captions => {
            let groups = group_captions(&file.annotations)?;
            for result in generator.captions(&groups) {
                let (_, example) = result?;
                serde_json::to_writer(&mut writer, &example)?;
                writer.write_all(b"\n")?;
                bar.inc(1);
                count += 1;
            }
        }
        Kind::Instances => {
            let categories = load_catalog(&file.categories)?;
            let groups = group_instances(&file.annotations, &images, decode_rle, None)?;
            for result in generator.instances(&groups, &categories) {
                let (_, example) = result?;
                serde_json::to_writer(&mut writer, &example)?;
                writer.write_all(b"\n")?;
                bar.inc(1);
                count += 1;
            }
        }
        Kind::PersonKeypoints => {
            let categories = load_catalog(&file.categories)?;
            let groups = group_person_keypoints(&file.annotations, &images, decode_rle, None)?;
            for result in generator.person_keypoints(&groups, &categories) {
                let (_, example) = result?;
                serde_json::to_writer(&mut writer, &example)?;
                writer.write_all(b"\n")?;
                bar.inc(1);
                count += 1;
            }
        }
    }

    writer.flush()?;
    bar.finish_and_clear();
    info!("wrote {} example records", count);
    Ok(())
}

fn schema(kind: Kind, decode_rle: bool) {
    let variant: Variant = kind.into();
    println!("{}:", variant);
    for field in example_schema(variant, decode_rle) {
        println!("  {}: {}", field.name, field.dtype);
    }
}

fn print_info(annotations: PathBuf) -> Result<(), Error> {
    let file = read_annotation_json(&annotations)?;
    let stats = json!({
        "info": file.info,
        "images": file.images.len(),
        "annotations": file.annotations.len(),
        "categories": file.categories.len(),
        "licenses": file.licenses.len(),
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    match args.cmd {
        Command::Convert {
            kind,
            annotations,
            image_dir,
            decode_rle,
            output,
        } => convert(kind, annotations, image_dir, decode_rle, output),
        Command::Schema { kind, decode_rle } => {
            schema(kind, decode_rle);
            Ok(())
        }
        Command::Info { annotations } => print_info(annotations),
    }
}
