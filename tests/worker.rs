use anyhow::Result;
use bytemap::worker::{self, Event, Job};
use bytemap::{Checkpoint, CodecError, DiagnosticLog, Settings, Summary};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn scratch_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("bytemap-worker-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

// Drains every event from a running conversion.
async fn collect(conversion: &mut worker::Conversion) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = conversion.next_event().await {
        events.push(event);
    }
    events
}

fn checkpoints(events: &[Event]) -> Vec<Checkpoint> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Progress(checkpoint) => Some(*checkpoint),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn encode_then_decode_jobs() -> Result<()> {
    let dir = scratch_dir("roundtrip")?;
    let settings = Arc::new(Settings::default());
    let input = dir.join("data.csv");
    let original = "id,name,score\n1,alpha,10\n2,beta,20\n".repeat(50);
    fs::write(&input, &original)?;

    let mut conversion = worker::spawn(
        Job::Encode {
            input: input.clone(),
            output_dir: dir.clone(),
        },
        Arc::clone(&settings),
        None,
    );
    let events = collect(&mut conversion).await;
    let summary = conversion.finish().await?;

    let seen = checkpoints(&events);
    assert_eq!(seen.first(), Some(&Checkpoint::Started));
    assert_eq!(seen.last(), Some(&Checkpoint::Finished));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
    assert!(matches!(events.last(), Some(Event::Finished(Summary::Encoded { .. }))));

    let image = match summary {
        Summary::Encoded { output, .. } => output,
        other => panic!("expected an image, got {:?}", other),
    };

    let mut conversion = worker::spawn(
        Job::Decode {
            input: image,
            output_dir: dir.clone(),
        },
        settings,
        None,
    );
    let events = collect(&mut conversion).await;
    conversion.finish().await?;
    assert_eq!(checkpoints(&events).last(), Some(&Checkpoint::Finished));

    assert_eq!(fs::read_to_string(dir.join("data.bytemap.output"))?, original);

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[tokio::test]
async fn failing_job_reports_once_and_logs() -> Result<()> {
    let dir = scratch_dir("failure")?;
    let log = Arc::new(DiagnosticLog::open(dir.join("error.log"))?);

    let mut conversion = worker::spawn(
        Job::Decode {
            input: dir.join("does-not-exist.png"),
            output_dir: dir.clone(),
        },
        Arc::new(Settings::default()),
        Some(Arc::clone(&log)),
    );
    let events = collect(&mut conversion).await;
    let err = conversion.finish().await.unwrap_err();
    assert!(matches!(err, CodecError::Io(_)), "{err}");

    let failures = events
        .iter()
        .filter(|event| matches!(event, Event::Failed(_)))
        .count();
    assert_eq!(failures, 1);
    assert!(!checkpoints(&events).contains(&Checkpoint::Finished));

    log.flush()?;
    let entries = fs::read_to_string(log.path())?;
    assert!(entries.contains("ERROR decode_file:"));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_jobs_share_one_log() -> Result<()> {
    let dir = scratch_dir("concurrent")?;
    let log = Arc::new(DiagnosticLog::open(dir.join("error.log"))?);
    let settings = Arc::new(Settings::default());

    let conversions: Vec<_> = (0..4)
        .map(|i| {
            worker::spawn(
                Job::Encode {
                    input: dir.join(format!("missing-{}.bin", i)),
                    output_dir: dir.clone(),
                },
                Arc::clone(&settings),
                Some(Arc::clone(&log)),
            )
        })
        .collect();

    for conversion in conversions {
        assert!(conversion.finish().await.is_err());
    }

    log.flush()?;
    let entries = fs::read_to_string(log.path())?;
    assert_eq!(entries.lines().count(), 4);
    assert!(entries.lines().all(|line| line.contains("ERROR encode_file:")));

    fs::remove_dir_all(&dir)?;
    Ok(())
}
