use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use services::{AppServices, Clock, DrillService, EmissionOutcome, RemediationEmitter};
use storage::repository::{
    ActivityRepository, InMemoryRepository, StorageError, TaskEvent, TaskRepository,
};
use tokio::sync::broadcast;
use vault_core::model::{
    CertTrack, Drill, DrillId, ModuleKind, NewModule, NewTask, Question, QuestionOption,
    RemediationTask, TaskId, TaskOrigin, TaskStatus,
};
use vault_core::quiz::{QuizMode, QuizPhase, QuizVerdict};
use vault_core::time::fixed_now;

fn drill(id: &str, domain: &str, questions: u32) -> Drill {
    Drill {
        id: DrillId::new(id),
        title: format!("{domain} drill"),
        domain: domain.into(),
        questions: (1..=questions)
            .map(|n| Question {
                id: n,
                text: format!("Question {n}"),
                options: vec![
                    QuestionOption::Label("yes".into()),
                    QuestionOption::Label("no".into()),
                ],
                correct_answer: "yes".into(),
                explanation: "Because.".into(),
            })
            .collect(),
    }
}

fn app() -> AppServices {
    AppServices::in_memory(Clock::fixed(fixed_now()))
        .with_drills(|d| d.with_auto_advance_delay(Duration::ZERO))
}

#[tokio::test]
async fn single_correct_answer_scores_full_marks_without_a_task() {
    let app = app();
    let drills = app.drills();
    let mut session = drills
        .start(&drill("iam-1", "IAM", 1), CertTrack::Cissp, QuizMode::Practice)
        .unwrap();

    drills.answer(&mut session, "yes").await.unwrap();
    let result = drills.advance(&mut session).await.unwrap();

    let completion = result.completion.expect("completed");
    assert_eq!(completion.score, 100);
    assert_eq!(completion.verdict, QuizVerdict::Maintained);
    assert!(app.board().lanes().await.unwrap().iter().all(|l| l.tasks.is_empty()));
}

#[tokio::test]
async fn two_of_five_creates_a_critical_task() {
    let app = app();
    let drills = app.drills();
    let mut session = drills
        .start(&drill("net-2", "COMM_NET_SEC", 5), CertTrack::Cissp, QuizMode::Diagnostic)
        .unwrap();

    let mut completions = 0;
    for answer in ["yes", "no", "no", "yes", "no"] {
        if drills.answer(&mut session, answer).await.unwrap().completion.is_some() {
            completions += 1;
        }
    }
    assert_eq!(completions, 1);
    assert_eq!(session.quiz().final_score_percent(), Some(40));

    let lanes = app.board().lanes().await.unwrap();
    let todo = &lanes[0].tasks;
    assert_eq!(todo.len(), 1);
    assert_eq!(todo[0].priority, 10);
    assert_eq!(todo[0].origin, TaskOrigin::QuizFailure);
    assert_eq!(todo[0].title, "REMEDIATE: COMM_NET_SEC drill [Score: 40%]");
    assert_eq!(todo[0].score, Some(40));

    let target = app.board().remediation_target(todo[0].id).await.unwrap();
    assert_eq!(target, Some(DrillId::new("net-2")));
}

#[tokio::test]
async fn mastery_retry_closes_the_remediation_task() {
    let app = app();
    let drills = app.drills();
    let content = drill("ops-1", "SEC_OPS", 2);
    let mut session = drills
        .start(&content, CertTrack::Cissp, QuizMode::Diagnostic)
        .unwrap();

    for answer in ["no", "yes"] {
        drills.answer(&mut session, answer).await.unwrap();
    }
    drills.restart(&mut session).unwrap();
    for answer in ["yes", "yes"] {
        drills.answer(&mut session, answer).await.unwrap();
    }

    let lanes = app.board().lanes().await.unwrap();
    assert!(lanes[0].tasks.is_empty());
    assert_eq!(lanes[3].tasks.len(), 1);
    assert_eq!(lanes[3].tasks[0].status, TaskStatus::Completed);

    let dashboard = app.dashboard().snapshot(CertTrack::Cissp, fixed_now()).await;
    assert_eq!(dashboard.activity_count, 2);
    let ops = dashboard.domains.iter().find(|d| d.id == "SEC_OPS").unwrap();
    assert_eq!(ops.percent, 75);
}

#[tokio::test]
async fn cancelled_auto_advance_emits_nothing() {
    let repo = InMemoryRepository::new();
    let clock = Clock::fixed(fixed_now());
    let emitter = Arc::new(RemediationEmitter::new(clock, Arc::new(repo.clone())));
    let drills = DrillService::new(clock, emitter, Arc::new(repo.clone()))
        .with_auto_advance_delay(Duration::from_secs(60));

    let mut session = drills
        .start(&drill("iam-1", "IAM", 1), CertTrack::Cissp, QuizMode::Diagnostic)
        .unwrap();
    let pending = tokio::time::timeout(
        Duration::from_millis(20),
        drills.answer(&mut session, "no"),
    )
    .await;

    assert!(pending.is_err());
    assert_eq!(session.quiz().phase(), QuizPhase::Answering { index: 0 });
    assert!(session.quiz().awaiting_auto_advance());
    drop(session);

    assert!(repo.list_tasks().await.unwrap().is_empty());
    assert!(repo.activities_for_track(CertTrack::Cissp).await.unwrap().is_empty());
}

/// A task store that rejects every write.
struct Unreachable {
    events: broadcast::Sender<TaskEvent>,
}

impl Unreachable {
    fn new() -> Self {
        Self {
            events: broadcast::channel(1).0,
        }
    }
}

fn offline() -> StorageError {
    StorageError::Connection("store unreachable".into())
}

#[async_trait]
impl TaskRepository for Unreachable {
    async fn create_task(&self, _task: NewTask) -> Result<RemediationTask, StorageError> {
        Err(offline())
    }

    async fn get_task(&self, _id: TaskId) -> Result<Option<RemediationTask>, StorageError> {
        Err(offline())
    }

    async fn list_tasks(&self) -> Result<Vec<RemediationTask>, StorageError> {
        Err(offline())
    }

    async fn open_tasks_for_drill(
        &self,
        _drill_id: &DrillId,
    ) -> Result<Vec<RemediationTask>, StorageError> {
        Err(offline())
    }

    async fn update_status(
        &self,
        _id: TaskId,
        _status: TaskStatus,
    ) -> Result<RemediationTask, StorageError> {
        Err(offline())
    }

    async fn delete_task(&self, _id: TaskId) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn purge_completed(&self) -> Result<u64, StorageError> {
        Err(offline())
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn store_failures_do_not_block_the_user() {
    let clock = Clock::fixed(fixed_now());
    let emitter = Arc::new(RemediationEmitter::new(clock, Arc::new(Unreachable::new())));
    let drills = DrillService::new(clock, emitter, Arc::new(InMemoryRepository::new()))
        .with_auto_advance_delay(Duration::ZERO);

    let mut session = drills
        .start(&drill("iam-1", "IAM", 1), CertTrack::Cissp, QuizMode::Diagnostic)
        .unwrap();
    let failed = drills.answer(&mut session, "no").await.unwrap();
    assert_eq!(failed.completion.unwrap().emission, EmissionOutcome::Failed);

    drills.restart(&mut session).unwrap();
    let mastered = drills.answer(&mut session, "yes").await.unwrap();
    assert_eq!(mastered.completion.unwrap().emission, EmissionOutcome::Failed);
}

#[tokio::test]
async fn sqlite_backed_services_share_one_store() {
    let app = AppServices::new_sqlite(
        "sqlite:file:services_drill_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .unwrap()
    .with_drills(|d| d.with_auto_advance_delay(Duration::ZERO));

    let mut feed = app.board().subscribe().await.unwrap();
    let drills = app.drills();
    let mut session = drills
        .start(&drill("aws-1", "D2", 4), CertTrack::AwsSap, QuizMode::Diagnostic)
        .unwrap();
    for answer in ["yes", "no", "no", "no"] {
        drills.answer(&mut session, answer).await.unwrap();
    }

    let board = feed.next().await.unwrap();
    assert_eq!(board.tasks().len(), 1);
    assert_eq!(board.tasks()[0].track, Some(CertTrack::AwsSap));

    let dashboard = app.dashboard().try_snapshot(CertTrack::AwsSap, fixed_now()).await.unwrap();
    assert_eq!(dashboard.activity_count, 1);
    // 25% in a domain weighted 0.29
    assert_eq!(dashboard.readiness.competency_score, 7);
}

#[tokio::test]
async fn quiz_module_plays_as_a_drill_and_files_remediation() {
    let app = app();
    let config = serde_json::to_string(&drill("ignored", "IAM", 2)).unwrap();
    let module = app
        .modules()
        .ingest(
            NewModule::new(CertTrack::Cissp, "IAM refresher", "iam", ModuleKind::Quiz)
                .unwrap()
                .with_config(config),
        )
        .await
        .unwrap();

    let (module, loaded) = app.modules().drill_for_module(module.id).await.unwrap();
    assert!(loaded.fault.is_none());
    assert_eq!(loaded.drill.id, DrillId::new("ignored"));
    assert_eq!(loaded.drill.title, "IAM refresher");

    let drills = app.drills();
    let mut session = drills
        .start(&loaded.drill, module.track, QuizMode::Diagnostic)
        .unwrap();
    drills.answer(&mut session, "no").await.unwrap();
    let done = drills.answer(&mut session, "no").await.unwrap();
    assert_eq!(done.completion.unwrap().score, 0);

    let lanes = app.board().lanes().await.unwrap();
    assert_eq!(lanes[0].tasks.len(), 1);
    assert_eq!(lanes[0].tasks[0].domain, "IAM");
    assert_eq!(lanes[0].tasks[0].drill_id, Some(DrillId::new("ignored")));
}
