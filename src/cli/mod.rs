// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, picks the compute backend, delegates to Layer 2 and
// prints the results.
//
//   1. `train`    — fine-tune on a CoNLL dataset, print report
//   2. `evaluate` — score a checkpoint on a CoNLL file
//   3. `predict`  — tag a sentence
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::Autodiff;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::application::evaluate_use_case::{Evaluation, PredictionExample};

#[cfg(feature = "wgpu")]
type InferenceBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
type InferenceBackend = burn::backend::NdArray;

type TrainingBackend = Autodiff<InferenceBackend>;

#[derive(Parser, Debug)]
#[command(
    name = "conll-ner",
    version = "0.1.0",
    about = "Fine-tune a transformer tagger for named entity recognition on CoNLL data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let use_case = TrainUseCase::new(args.into());
    let outcome  = use_case.execute::<TrainingBackend>(Default::default())?;

    print_evaluation(&outcome.evaluation);
    println!(
        "precision: {:.4}  recall: {:.4}  f1: {:.4}",
        outcome.summary.precision, outcome.summary.recall, outcome.summary.f1
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(
        args.checkpoint_dir,
        args.conll_file,
        args.separator,
        args.num_examples,
    );
    let evaluation = use_case.execute::<InferenceBackend>(Default::default())?;
    print_evaluation(&evaluation);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::<InferenceBackend>::new(&args.checkpoint_dir, Default::default())?;
    for (word, tag) in use_case.tag_text(&args.text)? {
        println!("{word:<20} {tag}");
    }
    Ok(())
}

fn print_evaluation(evaluation: &Evaluation) {
    println!("\n{}", evaluation.report);
    println!("token accuracy: {:.4}\n", evaluation.token_accuracy);
    for example in &evaluation.examples {
        print_example(example);
    }
}

fn print_example(example: &PredictionExample) {
    let width = example.tokens.iter().map(|t| t.chars().count()).max().unwrap_or(0).max(5);
    println!("{:<width$} {:<8} {:<8}", "token", "true", "pred");
    for ((token, gold), pred) in example.tokens.iter().zip(&example.true_labels).zip(&example.pred_labels) {
        let marker = if gold == pred { "" } else { "  *" };
        println!("{token:<width$} {gold:<8} {pred:<8}{marker}");
    }
    println!();
}
