//! Interface de linha de comando do KGE-QA: pergunta única ou REPL interativo.
//!
//! ```bash
//! # Uma pergunta, usando os arquivos da configuração
//! kgeqa --config kgeqa.toml who directed titanic
//!
//! # REPL sobre o knowledge graph de demonstração, com eventos em JSON
//! kgeqa --demo --events
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use kgeqa_core::corpus::{demo_model, demo_questions};
use kgeqa_core::embedding::EmbeddingIndex;
use kgeqa_core::{PipelineEvent, QaConfig, QaPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "enter your question >> ";
const NEIGHBORS_SHOWN: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "kgeqa")]
#[command(about = "Perguntas factuais sobre um knowledge graph", long_about = None)]
struct Args {
    /// Arquivo de configuração (TOML, YAML ou JSON)
    #[arg(long)]
    config: Option<String>,

    /// Usa o knowledge graph de demonstração em vez dos arquivos
    #[arg(long)]
    demo: bool,

    /// Imprime cada evento do pipeline como uma linha JSON
    #[arg(long)]
    events: bool,

    /// Pergunta; sem ela, abre o REPL
    question: Vec<String>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let pipeline = match build_pipeline(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Falha ao carregar o modelo: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout();
    let result = if args.question.is_empty() {
        repl(&pipeline, args.events, &mut stdout)
    } else {
        ask(&pipeline, &args.question.join(" "), args.events, &mut stdout)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Erro de I/O: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_pipeline(args: &Args) -> kgeqa_core::Result<QaPipeline> {
    let config = QaConfig::load(args.config.as_deref())?;
    if args.demo {
        info!("Usando o knowledge graph de demonstração");
        return Ok(QaPipeline::with_config(demo_model(), config));
    }
    QaPipeline::from_config(config)
}

/// Responde uma pergunta; com `events`, escreve cada evento como uma linha JSON.
fn ask(pipeline: &QaPipeline, question: &str, events: bool, out: &mut impl Write) -> io::Result<()> {
    if !events {
        return writeln!(out, "{}", pipeline.answer(question));
    }

    let (tx, rx) = mpsc::channel::<PipelineEvent>();
    // Pipeline síncrono em outra thread; os eventos são escritos à medida que chegam
    std::thread::scope(|s| {
        s.spawn(move || pipeline.answer_streaming(question, tx));
        for event in rx {
            match serde_json::to_string(&event) {
                Ok(json) => writeln!(out, "{}", json)?,
                Err(e) => tracing::warn!("Evento não serializável: {}", e),
            }
        }
        Ok(())
    })
}

fn repl(pipeline: &QaPipeline, events: bool, out: &mut impl Write) -> io::Result<()> {
    let stdin = io::stdin();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !run_command(pipeline, line, out)? {
            ask(pipeline, line, events, out)?;
        }
    }
}

/// Executa um comando `:xxx` do REPL. Retorna `false` se a linha não é comando.
fn run_command(pipeline: &QaPipeline, line: &str, out: &mut impl Write) -> io::Result<bool> {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();
    let model = &pipeline.model;

    match command {
        ":facts" => {
            for fact in model.facts().search(arg) {
                writeln!(out, "{}\t{}\t{}", fact.head, fact.relation, fact.tail)?;
            }
        }
        ":entities" => {
            for n in model.closest_entities(arg, NEIGHBORS_SHOWN) {
                writeln!(out, "{:.3}\t{}", n.similarity, n.name)?;
            }
        }
        ":relations" => {
            for n in model.closest_relations(arg, NEIGHBORS_SHOWN) {
                writeln!(out, "{:.3}\t{}", n.similarity, n.name)?;
            }
        }
        ":keys" => {
            writeln!(out, "entidades: {}", model.entities().keys().join(", "))?;
            writeln!(out, "relações: {}", model.relations().keys().join(", "))?;
        }
        ":examples" => {
            for question in demo_questions() {
                writeln!(out, "{}", question)?;
            }
        }
        ":help" => {
            writeln!(
                out,
                ":facts TERMO | :entities PALAVRA | :relations PALAVRA | :keys | :examples"
            )?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}
