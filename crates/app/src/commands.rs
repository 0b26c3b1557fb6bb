use std::error::Error;
use std::path::Path;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use services::{AppServices, Clock, DrillCompletion, EmissionOutcome, TrackDashboard};
use storage::repository::ActivityRepository;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use vault_core::model::{CertTrack, ConfigFault, Drill, ModuleId, ModuleKind, NewModule};
use vault_core::quiz::{QuizMode, SelectOutcome};

use crate::cli::{Cli, Commands, ModuleAction, TaskAction};
use crate::sample;

type CommandResult = Result<(), Box<dyn Error>>;

pub async fn execute(cli: Cli, app: AppServices) -> CommandResult {
    let track = cli.track;
    match cli.command {
        Commands::Readiness { session_minutes } => {
            readiness(&app, track, session_minutes, cli.json).await
        }
        Commands::Drill {
            file,
            module,
            mode,
            shuffle,
            advance_ms,
        } => {
            let app = app.with_drills(|d| {
                d.with_shuffle(shuffle)
                    .with_auto_advance_delay(Duration::from_millis(advance_ms))
            });
            let (drill_doc, track) = load_drill(&app, track, file.as_deref(), module).await?;
            drill(&app, track, &drill_doc, mode.into()).await
        }
        Commands::Tasks { action } => tasks(&app, action, cli.json).await,
        Commands::Modules { action } => {
            modules(&app, track, action.unwrap_or(ModuleAction::List), cli.json).await
        }
        Commands::Seed => seed(&app, track).await,
    }
}

//
// ─── READINESS ─────────────────────────────────────────────────────────────────
//

async fn readiness(
    app: &AppServices,
    track: CertTrack,
    session_minutes: i64,
    json: bool,
) -> CommandResult {
    let started_at = Clock::default_clock().now() - ChronoDuration::minutes(session_minutes);
    let dashboard = app.dashboard().snapshot(track, started_at).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_dashboard(&dashboard);
    }
    Ok(())
}

fn print_dashboard(dashboard: &TrackDashboard) {
    let readiness = &dashboard.readiness;
    let stale = if dashboard.stale { "  (stale)" } else { "" };
    println!("{} READINESS{stale}", dashboard.track);
    println!(
        "  competency  {:>3}%  {}",
        readiness.competency_score, readiness.stability
    );
    println!("  fatigue     {}", readiness.fatigue_display);
    println!(
        "  load        {} min{}",
        dashboard.operator_load.minutes,
        if dashboard.operator_load.overloaded {
            "  OVERLOAD"
        } else {
            ""
        }
    );
    println!("  activity    {} attempts", dashboard.activity_count);
    println!();
    for domain in &dashboard.domains {
        println!(
            "  {:<18} w{:>2}%  {:>3}%  {:<8}  {}",
            domain.id,
            domain.weight_percent,
            domain.percent,
            domain.band.as_str(),
            domain.label
        );
    }
}

//
// ─── DRILL ─────────────────────────────────────────────────────────────────────
//

/// Resolves the drill to play and the track its telemetry is filed under.
async fn load_drill(
    app: &AppServices,
    track: CertTrack,
    file: Option<&Path>,
    module: Option<ModuleId>,
) -> Result<(Drill, CertTrack), Box<dyn Error>> {
    if let Some(id) = module {
        let (module, loaded) = app.modules().drill_for_module(id).await?;
        match loaded.fault {
            Some(ConfigFault::Corrupt(_)) => println!("Module {id} has a corrupt quiz config."),
            Some(ConfigFault::Missing) => println!("Module {id} has no quiz config."),
            None => {}
        }
        return Ok((loaded.drill, module.track));
    }

    let drill = match file {
        Some(path) => Drill::from_json(&std::fs::read_to_string(path)?)?,
        None => sample::bundled_drill(track)?,
    };
    Ok((drill, track))
}

async fn drill(
    app: &AppServices,
    track: CertTrack,
    drill: &Drill,
    mode: QuizMode,
) -> CommandResult {
    let malformed = drill.malformed_questions();
    if !malformed.is_empty() {
        tracing::warn!(drill_id = %drill.id, ?malformed, "questions can never be scored correct");
    }

    let drills = app.drills();
    let mut session = drills.start(drill, track, mode)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{} ({:?}, {} questions)", drill.title, mode, drill.questions.len());
    println!("Answer with the option number, or q to abort.");

    loop {
        let Some(question) = session.quiz().current_question().cloned() else {
            break;
        };
        let progress = session.quiz().progress();
        println!();
        println!("[{}/{}] {}", progress.position, progress.total, question.text);
        if question.options.is_empty() {
            drills.abort(session);
            println!("This question has no options. Drill ended; nothing was recorded.");
            return Ok(());
        }
        for (n, option) in question.options.iter().enumerate() {
            println!("  {}. {}", n + 1, option.text());
        }

        let Some(choice) = prompt_choice(&mut input, question.options.len()).await? else {
            drills.abort(session);
            println!("Drill aborted. Nothing was recorded.");
            return Ok(());
        };

        let mut result = drills
            .answer(&mut session, question.options[choice].identity())
            .await?;

        if let SelectOutcome::Review(feedback) = &result.outcome {
            println!("{}", if feedback.correct { "Correct." } else { "Incorrect." });
            if !feedback.explanation.is_empty() {
                println!("  {}", feedback.explanation);
            }
            println!("[enter] to continue");
            if input.next_line().await?.is_none() {
                drills.abort(session);
                println!("Drill aborted. Nothing was recorded.");
                return Ok(());
            }
            result = drills.advance(&mut session).await?;
        }

        if let Some(completion) = result.completion {
            print_completion(&completion);
            break;
        }
    }
    Ok(())
}

/// Reads a 1-based option number. `None` when the user quits or no choice
/// is possible.
async fn prompt_choice<R>(
    input: &mut Lines<R>,
    options: usize,
) -> Result<Option<usize>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    if options == 0 {
        return Ok(None);
    }
    loop {
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=options).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("Enter a number from 1 to {options}."),
        }
    }
}

fn print_completion(completion: &DrillCompletion) {
    println!();
    println!("Score: {}% ({:?})", completion.score, completion.verdict);
    match &completion.emission {
        EmissionOutcome::Created(id) => println!("Remediation task {id} added to the board."),
        EmissionOutcome::Closed(0) => println!("Mastery confirmed."),
        EmissionOutcome::Closed(n) => println!("Mastery confirmed. Closed {n} remediation task(s)."),
        EmissionOutcome::Failed => println!("Could not update the board; see the log."),
    }
}

//
// ─── TASKS ─────────────────────────────────────────────────────────────────────
//

async fn tasks(app: &AppServices, action: TaskAction, json: bool) -> CommandResult {
    let board = app.board();
    match action {
        TaskAction::List => {
            let lanes = board.lanes().await?;
            if json {
                let tasks: Vec<_> = lanes.iter().flat_map(|l| l.tasks.iter()).collect();
                println!("{}", serde_json::to_string_pretty(&tasks)?);
                return Ok(());
            }
            for lane in lanes {
                println!("{} ({})", lane.label, lane.tasks.len());
                for task in &lane.tasks {
                    println!("  [{:>2}] {}  {}", task.priority, task.id, task.title);
                }
            }
        }
        TaskAction::Add { title } => {
            let task = board.add_manual(&title).await?;
            println!("{}", task.id);
        }
        TaskAction::Move { id, status } => {
            let task = board.move_task(id, status).await?;
            println!("{} -> {}", task.id, task.status.lane_label());
        }
        TaskAction::Delete { id } => {
            board.delete(id).await?;
            println!("deleted {id}");
        }
        TaskAction::Purge => {
            let removed = board.purge_completed().await?;
            println!("purged {removed} completed task(s)");
        }
    }
    Ok(())
}

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

async fn modules(
    app: &AppServices,
    track: CertTrack,
    action: ModuleAction,
    json: bool,
) -> CommandResult {
    let vault = app.modules();
    match action {
        ModuleAction::List => {
            let groups = vault.list_modules(track).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
                return Ok(());
            }
            if groups.is_empty() {
                println!("No modules for {track}.");
            }
            for group in groups {
                println!("{} ({})", group.label, group.modules.len());
                for module in &group.modules {
                    println!(
                        "  [{:>3}] {:<7} {}",
                        module.id.value(),
                        module.kind.as_str(),
                        module.title
                    );
                }
            }
        }
        ModuleAction::Add {
            title,
            domain,
            kind,
            config,
            asset,
            description,
        } => {
            let mut new =
                NewModule::new(track, title, &domain, kind)?.with_description(description);
            if let Some(path) = config {
                new = new.with_config(std::fs::read_to_string(path)?);
            }
            if let Some(asset) = asset {
                new = new.with_asset_path(asset);
            }
            let module = vault.ingest(new).await?;
            println!("{} {} {}", module.id, module.kind, module.domain);
        }
        ModuleAction::Delete { id } => {
            vault.delete(id).await?;
            println!("deleted module {id}");
        }
    }
    Ok(())
}

//
// ─── SEED ──────────────────────────────────────────────────────────────────────
//

async fn seed(app: &AppServices, track: CertTrack) -> CommandResult {
    let records = sample::seed_activities(track, Clock::default_clock().now())?;
    let activities = &app.storage().activities;
    for record in &records {
        activities.append_activity(record).await?;
    }
    tracing::info!(%track, count = records.len(), "seeded activity");

    let bundled = sample::bundled_drill(track)?;
    let config = serde_json::to_string(&bundled)?;
    let quiz = NewModule::new(track, bundled.title.clone(), &bundled.domain, ModuleKind::Quiz)?
        .with_config(config);
    let module = app.modules().ingest(quiz).await?;

    println!(
        "seeded {} activity records and quiz module {} for {track}",
        records.len(),
        module.id
    );
    Ok(())
}
