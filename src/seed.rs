//! Demo data, created through the repository operations so every lifecycle
//! rule applies to it as it would to client traffic.

use anyhow::{bail, Context};
use tracing::info;

use crate::models::{Comment, NewComment, NewReport, Report};
use crate::repo::{Repo, RepoResult};

pub struct Seeded {
    pub reports: Vec<Report>,
    pub comments: Vec<Comment>,
}

fn report(title: &str, location: &str, description: &str, password: &str) -> NewReport {
    NewReport {
        title: Some(title.into()),
        location: Some(location.into()),
        description: Some(description.into()),
        password: Some(password.into()),
    }
}

pub fn initial_reports() -> Vec<NewReport> {
    vec![
        report(
            "ET spotted outside of Area 51",
            "Roswell, NM",
            "I saw what can only be described as a very slender, very tall humanoid walking behind the fences at...",
            "51isTheKey",
        ),
        report(
            "Fairy lights in my backyard",
            "Utica, NY",
            "I saw floating lights in my backyard... on inspection they weren't fireflies...",
            "iLoveF4ri3s",
        ),
        report(
            "Corner of metal object sticking up out of the ground in the woods...",
            "Haven, Maine",
            "Late last night and the night before\n Tommyknockers, Tommyknockers\n knocking at the door",
            "kingwasright",
        ),
    ]
}

pub async fn seed_initial_data(repo: &dyn Repo) -> RepoResult<Seeded> {
    let mut reports = Vec::new();
    for new in initial_reports() {
        reports.push(repo.create_report(new).await?);
    }

    // (index into `reports`, content)
    let threads = [
        (0, "I saw that, too... let's meet up to discuss"),
        (1, "Look, I believe in a lot of things but are fairy lights even real?"),
        (1, "Hey, don't question the report. Question the government! They've been lying to us all these years."),
    ];
    let mut comments = Vec::new();
    for (idx, content) in threads {
        let new = NewComment { content: Some(content.into()) };
        comments.push(repo.create_comment(reports[idx].id, new).await?);
    }

    info!(reports = reports.len(), comments = comments.len(), "seed data created");
    Ok(Seeded { reports, comments })
}

/// Exercises the failure paths against freshly seeded data: closes the first
/// report, then checks each refusal comes back with the expected kind.
/// Returns the open listing afterwards. Fails on the first surprise.
pub async fn smoke_check(repo: &dyn Repo, seeded: &Seeded) -> anyhow::Result<Vec<Report>> {
    let [first, second, ..] = seeded.reports.as_slice() else {
        bail!("smoke check needs at least two seeded reports");
    };

    repo.close_report(first.id, Some("51isTheKey")).await?;
    info!(report_id = first.id, "closed");

    expect(
        "close twice",
        repo.close_report(first.id, Some("51isTheKey")).await,
        "AlreadyClosed",
    )?;
    expect(
        "comment on closed",
        repo.create_comment(first.id, NewComment { content: Some("anyone?".into()) }).await,
        "Closed",
    )?;
    expect("wrong password", repo.close_report(second.id, Some("nope")).await, "InvalidCredential")?;
    expect("unknown report", repo.close_report(300, Some("x")).await, "NotFound")?;
    expect(
        "missing field",
        repo.create_report(NewReport { title: None, ..initial_reports().remove(0) }).await,
        "ValidationError",
    )?;

    let open = repo.list_open_reports().await.context("listing after smoke check")?;
    for r in &open {
        info!(id = r.id, expired = r.is_expired, comments = r.comments.len(), "open report");
    }
    Ok(open)
}

fn expect<T>(step: &str, outcome: RepoResult<T>, kind: &str) -> anyhow::Result<()> {
    match outcome {
        Err(e) if e.name() == kind => {
            info!(step, error = e.name(), "refused as expected");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("{step}: expected {kind}"))),
        Ok(_) => bail!("{step}: expected {kind}, got success"),
    }
}
