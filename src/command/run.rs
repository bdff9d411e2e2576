//! One build (or question) session: context, budget gate, streamed turns.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::api::{
    ApiClient, CompletionOptions, CompletionProvider, HttpCompletionProvider, HttpEmbeddingProvider,
    ProviderError,
};
use crate::budget::{format_thousands, BudgetGate, GateDecision, PricingTable, TokenCounter};
use crate::cli::args::{DEFAULT_EMBEDDING_MODEL, DEFAULT_MAX_ESTIMATED_COST, DEFAULT_MODEL};
use crate::cli::{resolve_workspace_root, Cli};
use crate::command::report;
use crate::config::ConfigFile;
use crate::conversation::Conversation;
use crate::credentials::{Credentials, ModelId};
use crate::domain::Mode;
use crate::prompt::{images, resources, ContextAssembler};
use crate::ranking::{FileCacheStore, RelevanceRanker};
use crate::stream::{estimated_characters, run_turn, TerminalView};
use crate::workspace::{eligible_files, read_files, IgnoreSpec, UploadFilter, DEFAULT_MAX_FILE_SIZE};
use crate::writer::write_files;

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root: PathBuf,
    pub model: String,
    pub model_embedding: String,
    pub focused: Option<usize>,
    pub ignore: Vec<String>,
    pub max_file_size: u64,
    pub max_estimated_cost: Option<f64>,
    pub write: bool,
    pub mode: Mode,
    pub resources: Vec<String>,
    pub images: Vec<PathBuf>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub yes: bool,
    pub verbose: bool,
}

impl RunSettings {
    pub fn resolve(cli: &Cli, config: &ConfigFile) -> Result<Self> {
        let root = resolve_workspace_root(cli.dir.as_deref())?;
        Ok(Self::merge(cli, config, root))
    }

    fn merge(cli: &Cli, config: &ConfigFile, root: PathBuf) -> Self {
        let mut ignore = config.ignore.clone();
        ignore.extend(cli.ignore.iter().cloned());
        let mut resource_urls = config.resources.clone();
        resource_urls.extend(cli.resources.iter().cloned());

        Self {
            root,
            model: cli
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_embedding: cli
                .model_embedding
                .clone()
                .or_else(|| config.model_embedding.clone())
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            focused: cli.focused.filter(|n| *n > 0),
            ignore,
            max_file_size: cli
                .max_file_size
                .or(config.max_file_size)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            max_estimated_cost: Some(
                cli.max_estimated_cost
                    .or(config.max_estimated_cost)
                    .unwrap_or(DEFAULT_MAX_ESTIMATED_COST),
            ),
            write: cli.write,
            mode: cli.mode,
            resources: resource_urls,
            images: cli.images.clone(),
            max_tokens: cli.max_tokens,
            temperature: cli.temperature,
            yes: cli.yes,
            verbose: cli.verbose,
        }
    }
}

/// Positional args, else piped stdin, else an interactive prompt.
pub fn read_requirements<R: BufRead, W: Write>(
    args: &[String],
    stdin_is_tty: bool,
    input: &mut R,
    out: &mut W,
) -> io::Result<String> {
    if !args.is_empty() {
        return Ok(args.join(" ").trim().to_string());
    }
    if !stdin_is_tty {
        let mut piped = String::new();
        input.read_to_string(&mut piped)?;
        return Ok(piped.trim().to_string());
    }

    writeln!(out, "{}", " 🕹️  What are your requirements?".yellow())?;
    prompt_line(input, out, "    > ")
}

fn prompt_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<String> {
    write!(out, "{}", prompt.bright_magenta())?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// `[Y/n]` prompt; an empty answer means yes.
fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<bool> {
    let answer = prompt_line(input, out, &format!("  {} [Y/n]: ", question))?.to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

/// How the turn loop interacts with the user.
#[derive(Debug, Clone, Copy)]
pub struct TurnOptions {
    pub mode: Mode,
    pub auto_write: bool,
    /// Prompts (confirmation, write, follow-up) are only shown when set
    pub interactive: bool,
    /// Skip the send confirmation
    pub yes: bool,
}

#[derive(Debug)]
pub enum SessionEnd {
    Completed,
    /// The budget gate refused the send
    Cancelled { cost: f64, ceiling: f64 },
    /// The user declined at the confirmation prompt
    Declined,
    Failed(ProviderError),
}

/// Gate, stream, summarise and optionally write, then repeat for follow-ups.
pub async fn drive_session<P, R, W>(
    provider: &P,
    gate: &BudgetGate,
    root: &Path,
    conversation: &mut Conversation,
    options: TurnOptions,
    input: &mut R,
    out: &mut W,
) -> Result<SessionEnd>
where
    P: CompletionProvider + ?Sized,
    R: BufRead,
    W: Write,
{
    loop {
        match gate.check(conversation.messages(), out)? {
            GateDecision::Cancelled { cost, ceiling } => {
                writeln!(out, "\n 👋 {}", "Send cancelled.".yellow())?;
                return Ok(SessionEnd::Cancelled { cost, ceiling });
            }
            GateDecision::Proceed(account) => {
                if options.interactive && !options.yes {
                    let question = format!(
                        "This will use ~{} tokens before output - are you sure?",
                        format_thousands(account.total_tokens as u64)
                    );
                    if !confirm(input, out, &question)? {
                        writeln!(out, "\n 👋 {}", "Good day!".yellow())?;
                        return Ok(SessionEnd::Declined);
                    }
                }
            }
        }

        writeln!(out, "\n{}\n", " 🌐 STREAMING RESPONSE:".yellow())?;
        let (outcome, received) = {
            let mut view = TerminalView::new(&mut *out);
            let outcome = run_turn(provider, conversation.messages(), &mut view).await;
            (outcome, view.received_chars())
        };

        if let Some(estimate) = estimated_characters(&outcome.text) {
            writeln!(out, "\n    Received {} of ~{} estimated characters", received, estimate)?;
        }
        if outcome.is_truncated() {
            warn!("Response ended inside a file block; that file was not extracted");
        }
        conversation.push_assistant(&outcome.text);

        if options.mode == Mode::Implement && !outcome.files.is_empty() {
            report::write_changeset(out, root, conversation.requirements_history(), &outcome.files)?;

            let write = options.auto_write
                || (options.interactive && confirm(input, out, "Write changeset to files?")?);
            if write {
                let written = write_files(root, &outcome.files)?;
                info!("Wrote {} files", written.written.len());
                writeln!(out, "\n{}", " ✅ CHANGESET WRITTEN".yellow())?;
            }
        }

        if let Some(error) = outcome.error {
            return Ok(SessionEnd::Failed(error));
        }

        if options.mode == Mode::Question || !options.interactive {
            return Ok(SessionEnd::Completed);
        }

        writeln!(out, "\n{}", " 💬 Follow-up (empty to exit):".yellow())?;
        let follow_up = prompt_line(input, out, "    > ")?;
        if follow_up.is_empty() {
            return Ok(SessionEnd::Completed);
        }
        conversation.add_follow_up(follow_up);
    }
}

fn embedding_provider(model: &str) -> Result<HttpEmbeddingProvider> {
    let model = ModelId::parse(model)?;
    let credentials = Credentials::from_env(&model)?;
    let endpoint = credentials.embeddings_endpoint(&model.name)?;
    let client = ApiClient::new(credentials)?;
    Ok(HttpEmbeddingProvider::new(client, model.name, endpoint))
}

pub async fn run_build(cli: Cli) -> Result<()> {
    let config = ConfigFile::load_or_default(cli.config.as_deref())?;
    for name in config.apply_env() {
        debug!("Exported {} from config", name);
    }
    let settings = RunSettings::resolve(&cli, &config)?;

    let stdin = io::stdin();
    let stdin_is_tty = stdin.is_terminal();
    let interactive = stdin_is_tty && io::stdout().is_terminal();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let requirements = read_requirements(&cli.requirements, stdin_is_tty, &mut input, &mut out)?;
    if requirements.is_empty() {
        writeln!(out, "{}", "No requirements provided. Exiting.".yellow())?;
        return Ok(());
    }

    // All configuration errors surface before any work
    let model = ModelId::parse(&settings.model)?;
    let credentials = Credentials::from_env(&model)?;
    let embedder = match settings.focused {
        Some(_) => Some(embedding_provider(&settings.model_embedding)?),
        None => None,
    };
    let image_urls = images::encode_all(&settings.images)?;

    report::write_configuration(&mut out, &settings, &requirements)?;

    let counter = TokenCounter::for_model(&settings.model)?;
    let gate = BudgetGate::new(
        &model.qualified(),
        counter,
        PricingTable::default(),
        settings.max_estimated_cost.unwrap_or(f64::INFINITY),
    );

    let spec = IgnoreSpec::for_workspace(&settings.root, &settings.ignore);
    debug!("Compiled {} ignore rules", spec.patterns().len());
    let filter = UploadFilter::new(&settings.root, spec, settings.max_file_size);
    let eligible = eligible_files(&filter);

    let files = match (settings.focused, &embedder) {
        (Some(top_n), Some(embedder)) => {
            let store = FileCacheStore::for_workspace(&settings.root);
            debug!("Embedding cache at {}", store.root().display());
            let ranker = RelevanceRanker::new(embedder, &store);
            let ranked = ranker
                .rank(&filter, &requirements, top_n)
                .await
                .context("Relevance ranking failed")?;
            report::write_focused_files(&mut out, &ranked)?;
            ranked
        }
        _ => {
            let all_files = read_files(&settings.root, &eligible);
            let counter = settings.verbose.then(|| gate.counter());
            report::write_included_files(&mut out, &all_files, counter)?;
            all_files
        }
    };

    let fetched = resources::fetch_all(&settings.resources).await;
    let assembler = ContextAssembler::new(eligible.into_iter().map(|c| c.path).collect())
        .with_resources(resources::render_section(&fetched))
        .with_images(image_urls);
    let context = assembler.build(&[requirements.clone()], settings.mode, &files);
    let mut conversation = Conversation::start(requirements, context);

    let provider = HttpCompletionProvider::new(
        ApiClient::new(credentials)?,
        model.name.clone(),
        CompletionOptions {
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
    );
    let options = TurnOptions {
        mode: settings.mode,
        auto_write: settings.write,
        interactive,
        yes: settings.yes,
    };

    let end = drive_session(
        &provider,
        &gate,
        &settings.root,
        &mut conversation,
        options,
        &mut input,
        &mut out,
    )
    .await?;

    match end {
        SessionEnd::Failed(error) => {
            if error.is_auth_error() {
                eprintln!("Check the API key for {}.", model.provider);
            }
            Err(anyhow::Error::new(error).context("Completion failed"))
        }
        SessionEnd::Cancelled { cost, ceiling } => {
            info!("Cancelled: ${:.2} over the ${:.2} ceiling", cost, ceiling);
            Ok(())
        }
        SessionEnd::Completed | SessionEnd::Declined => Ok(()),
    }
}
