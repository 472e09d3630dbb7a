use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use elm_classifier::housing::{split_housing, INCOME_CATEGORIES};
use elm_classifier::model::metrics::accuracy;
use elm_classifier::parsing::{housing, mnist};
use elm_classifier::{
    load_table, logging, split_stratified, Activation, Elm, ElmConfig, ElmError, LabeledTable,
    Model, Result,
};
use json::object;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train an Extreme Learning Machine on a stratified split and report test accuracy
    Classify {
        /// The path of the dataset (headerless CSV, label in the last column)
        #[arg(short, long)]
        data: PathBuf,

        /// TOML file with the run configuration; flags below override it
        #[arg(short, long, default_value = None)]
        config: Option<PathBuf>,

        /// Fraction of each class used for training
        #[arg(short, long, default_value = None)]
        train_ratio: Option<f64>,

        /// Width of the random hidden layer
        #[arg(long, default_value = None)]
        hidden: Option<usize>,

        /// Activation function of the hidden layer
        #[arg(short, long, default_value = None)]
        activation: Option<Activation>,

        /// Seed for the split and the weight initialization
        #[arg(short, long, default_value = None)]
        seed: Option<u64>,

        /// Whether or not to export the model's weights
        /// Weights are exported in JSON format
        #[arg(short, long, default_value = None)]
        weight_path: Option<PathBuf>,
    },

    /// Print one handwritten digit from an MNIST CSV
    Digit {
        /// The path of the MNIST CSV (label first, then 784 pixels)
        #[arg(short, long)]
        data: PathBuf,

        /// Data row to show, starting at 0
        #[arg(short, long, default_value_t = 0)]
        row: usize,

        /// The file starts with a header line
        #[arg(long)]
        header: bool,
    },

    /// Split the housing dataset on income categories
    Housing {
        /// The path of housing.csv
        #[arg(short, long)]
        data: PathBuf,

        /// Fraction of the districts held out for testing
        #[arg(short, long, default_value_t = 0.2)]
        test_ratio: f64,

        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Use a plain random split instead of stratifying on income
        #[arg(long)]
        random: bool,
    },
}

/// Test the model on the held out set, returning the accuracy in percent
fn test_model(test: &LabeledTable, model: &Elm) -> Result<f64> {
    let predictions = model.predict(&test.features())?;

    accuracy(&predictions.classes, &test.labels)
}

/// Write the weights of the model in JSON format
/// The keys are W0 and b0 for the hidden layer and beta for the output weights
fn write_weights(weight_path: &Path, model: &Elm) -> Result<()> {
    let parameters = model.parameters().ok_or(ElmError::ModelNotTrained)?;
    let w: Vec<f64> = parameters.input_weights.iter().copied().collect();
    let b: Vec<f64> = parameters.input_bias.iter().copied().collect();
    let beta: Vec<f64> = parameters.beta.iter().copied().collect();

    let mut data = object! {};
    data["features"] = parameters.input_weights.nrows().into();
    data["hidden"] = parameters.input_weights.ncols().into();
    data["activation"] = parameters.activation.name().into();
    data["W0"] = w.into();
    data["b0"] = b.into();
    data["beta"] = beta.into();

    let io_error = |source| ElmError::Io {
        path: weight_path.to_path_buf(),
        source,
    };
    let mut file = File::create(weight_path).map_err(io_error)?;
    file.write_all(data.dump().as_bytes()).map_err(io_error)?;

    Ok(())
}

fn classify(
    data: &Path,
    config: Option<&Path>,
    train_ratio: Option<f64>,
    hidden: Option<usize>,
    activation: Option<Activation>,
    seed: Option<u64>,
    weight_path: Option<&Path>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => ElmConfig::from_file(path)?,
        None => ElmConfig::default(),
    };
    config.train_ratio = train_ratio.unwrap_or(config.train_ratio);
    config.hidden_dimension = hidden.unwrap_or(config.hidden_dimension);
    config.activation = activation.unwrap_or(config.activation);
    config.seed = seed.unwrap_or(config.seed);
    config.validate()?;

    let classes = config.class_set();
    let dataset = load_table(data, &classes)?;
    let split = split_stratified(&dataset, &classes, config.train_ratio, config.seed)?;
    println!(
        "Train set: {} x {}",
        split.train.len(),
        split.train.num_features()
    );
    println!(
        "Test set: {} x {}",
        split.test.len(),
        split.test.num_features()
    );

    let mut elm = Elm::new(config.hidden_dimension, config.activation, classes.len());
    elm.fit(&split.train, config.seed)?;
    info!(
        hidden = config.hidden_dimension,
        activation = config.activation.name(),
        "trained model"
    );

    if let Some(weight_path) = weight_path {
        write_weights(weight_path, &elm)?;
    }

    let acc = test_model(&split.test, &elm)?;
    println!("Accuracy: {:.2}%", acc);

    Ok(())
}

fn show_digit(data: &Path, row: usize, header: bool) -> Result<()> {
    let digit = mnist::load_digit(data, row, header)?;

    println!("Label: {}", digit.label);
    print!("{}", mnist::render(&digit));

    Ok(())
}

fn explore_housing(data: &Path, test_ratio: f64, seed: u64, random: bool) -> Result<()> {
    let records = housing::load_housing(data)?;
    let split = split_housing(&records, test_ratio, seed, !random)?;

    println!("Train set: {} districts", split.train.len());
    println!("Test set: {} districts", split.test.len());
    println!("income_cat  overall  train    test");
    for category in 0..INCOME_CATEGORIES {
        println!(
            "{:<10}  {:.4}   {:.4}   {:.4}",
            category + 1,
            split.overall[category],
            split.train_proportions[category],
            split.test_proportions[category]
        );
    }
    match split.bedrooms_median {
        Some(median) => println!(
            "total_bedrooms median: {} ({} missing values filled)",
            median, split.filled
        ),
        None => println!("total_bedrooms median: n/a"),
    }

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("{}", err);
    }

    let args = Args::parse();

    let outcome = match args.command {
        Command::Classify {
            data,
            config,
            train_ratio,
            hidden,
            activation,
            seed,
            weight_path,
        } => classify(
            &data,
            config.as_deref(),
            train_ratio,
            hidden,
            activation,
            seed,
            weight_path.as_deref(),
        ),
        Command::Digit { data, row, header } => show_digit(&data, row, header),
        Command::Housing {
            data,
            test_ratio,
            seed,
            random,
        } => explore_housing(&data, test_ratio, seed, random),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
