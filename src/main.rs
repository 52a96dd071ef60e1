use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use platescan::classifier::knn::select_k;
use platescan::detection::observer::{NoopObserver, PipelineObserver};
use platescan::pipeline::load_image;
use platescan::{
    AllCandidatesConfig, BestAspectConfig, DebugDump, DetectionPipeline, KnnClassifier,
    PlatePolicy, PlateRecognizer, RecognitionConfig, TrainingCorpus,
};

#[derive(Parser)]
#[command(name = "platescan")]
#[command(about = "Locate license plates in photographs and read their characters")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the plate text from one or more images
    Recognize {
        /// Input image files
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Trained classifier model
        #[arg(long, value_name = "FILE", default_value = "models/knn.json")]
        model: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Save debug outputs to directory (must be empty, single image only)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },

    /// Show the plate box and character boxes without classifying
    Segment {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },

    /// Train a classifier from a folder-per-label character corpus
    Train {
        #[arg(value_name = "CORPUS_DIR")]
        corpus: PathBuf,

        /// Where to write the trained model
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Number of neighbours
        #[arg(short, default_value_t = 1, conflicts_with = "search")]
        k: usize,

        /// Pick k by cross-validation over 1, 3 and 5
        #[arg(long)]
        search: bool,

        /// Cross-validation folds used by --search
        #[arg(long, default_value_t = 4)]
        folds: usize,

        /// Canonical glyph size
        #[arg(long, default_value_t = 20)]
        glyph_size: u32,
    },
}

#[derive(clap::Args)]
struct DetectionArgs {
    /// JSON configuration file overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Plate selection strategy (overrides the configuration file)
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Single plate in the lower half, aspect closest to 4.5
    BestAspect,
    /// Every plate-sized region
    AllCandidates,
}

impl DetectionArgs {
    fn load_config(&self) -> anyhow::Result<RecognitionConfig> {
        let mut config = match &self.config {
            Some(path) => RecognitionConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RecognitionConfig::default(),
        };
        if let Some(policy) = self.policy {
            let requested = match policy {
                PolicyArg::BestAspect => PlatePolicy::BestAspect(BestAspectConfig::default()),
                PolicyArg::AllCandidates => {
                    PlatePolicy::AllCandidates(AllCandidatesConfig::default())
                }
            };
            config.plate = config.plate.switch_strategy(requested);
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Recognize {
            images,
            model,
            detection,
            debug_out,
        } => recognize(images, model, detection, debug_out),
        Command::Segment {
            image,
            detection,
            debug_out,
        } => segment(image, detection, debug_out),
        Command::Train {
            corpus,
            output,
            k,
            search,
            folds,
            glyph_size,
        } => train(corpus, output, k, search, folds, glyph_size),
    }
}

fn recognize(
    images: Vec<PathBuf>,
    model: PathBuf,
    detection: DetectionArgs,
    debug_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = detection.load_config()?;
    let classifier = KnnClassifier::load(&model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let model_size = classifier.glyph_size();
    let recognizer = PlateRecognizer::new(config, Box::new(classifier));
    let glyph_size = recognizer.config().segmentation.glyph_size;
    if model_size != glyph_size {
        anyhow::bail!(
            "model was trained on {0}x{0} glyphs but segmentation produces {1}x{1}",
            model_size,
            glyph_size
        );
    }

    if let Some(debug_dir) = debug_out {
        if images.len() != 1 {
            anyhow::bail!("--debug-out takes exactly one image");
        }
        let img = load_image(&images[0])
            .with_context(|| format!("reading {}", images[0].display()))?;
        let mut dump = DebugDump::new(debug_dir)?;
        let result = recognizer.recognize_with(&img, &mut dump)?;
        print_result(&images[0], result.text(), result.is_empty());
        println!("Debug images saved to: {}", dump.output_dir().display());
        return Ok(());
    }

    let results = recognizer.recognize_batch(&images);
    for (path, result) in images.iter().zip(results) {
        match result {
            Ok(recognition) => print_result(path, recognition.text(), recognition.is_empty()),
            Err(e) => eprintln!("{}: error: {:#}", path.display(), anyhow::Error::from(e)),
        }
    }
    Ok(())
}

fn print_result(path: &std::path::Path, text: &str, no_plate: bool) {
    if no_plate {
        println!("{}: no plate detected", path.display());
    } else {
        println!("{}: {}", path.display(), text);
    }
}

fn segment(
    image: PathBuf,
    detection: DetectionArgs,
    debug_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let pipeline = DetectionPipeline::new(detection.load_config()?);
    let img = load_image(&image).with_context(|| format!("reading {}", image.display()))?;

    let mut dump = debug_out.map(DebugDump::new).transpose()?;
    let mut noop = NoopObserver;
    let observer: &mut dyn PipelineObserver = match dump.as_mut() {
        Some(dump) => dump,
        None => &mut noop,
    };

    let plates = pipeline.detect_with(&img, observer);
    if let Some(dump) = &dump {
        println!("Debug images saved to: {}", dump.output_dir().display());
    }
    if plates.is_empty() {
        println!("No plate detected.");
        return Ok(());
    }

    for (i, plate) in plates.iter().enumerate() {
        let b = plate.bbox;
        println!(
            "Plate {} at rows {}..{}, cols {}..{} - {} characters",
            i + 1,
            b.min_row,
            b.max_row,
            b.min_col,
            b.max_col,
            plate.glyphs.len()
        );
        for (j, c) in plate.character_boxes.iter().enumerate() {
            println!(
                "  Character {} at rows {}..{}, cols {}..{}",
                j + 1,
                c.min_row,
                c.max_row,
                c.min_col,
                c.max_col
            );
        }
    }
    Ok(())
}

fn train(
    corpus_dir: PathBuf,
    output: PathBuf,
    k: usize,
    search: bool,
    folds: usize,
    glyph_size: u32,
) -> anyhow::Result<()> {
    let corpus = TrainingCorpus::load(&corpus_dir, glyph_size)
        .with_context(|| format!("loading corpus {}", corpus_dir.display()))?;
    println!("Total samples: {}", corpus.len());
    for (label, count) in corpus.class_counts() {
        println!("  {}: {}", label, count);
    }

    let k = if search {
        let best = select_k(&corpus, &[1, 3, 5], folds)?;
        println!(
            "Best k: {} (cross-validation accuracy {:.2}%)",
            best.k,
            best.accuracy * 100.0
        );
        best.k
    } else {
        k
    };

    let model = KnnClassifier::fit(&corpus, k)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    model.save(&output)?;
    println!("Model saved at: {}", output.display());
    Ok(())
}
