use std::fs;
use std::hint::black_box;

use agent_log_viewer::Provider;
use agent_log_viewer::providers::{ClaudeProvider, CodexProvider};
use agent_log_viewer::utils::encode_cwd;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tempfile::TempDir;

const PROJECT: &str = "-Users-bench-project";
const SESSION: &str = "550e8400-e29b-41d4-a716-446655440000";

/// Generate a Claude session of N user/assistant exchanges, with streamed partial duplicates
fn generate_claude_session(num_exchanges: usize) -> TempDir {
    let root = TempDir::new().unwrap();
    let project_dir = root.path().join("projects").join(PROJECT);
    fs::create_dir_all(&project_dir).unwrap();

    let mut lines = Vec::with_capacity(num_exchanges * 3);
    for i in 0..num_exchanges {
        lines.push(format!(
            r#"{{"type":"user","uuid":"u{}","timestamp":"2024-01-01T12:00:00Z","message":{{"role":"user","content":"Prompt number {}"}}}}"#,
            i, i
        ));
        lines.push(format!(
            r#"{{"type":"assistant","uuid":"a{}","timestamp":"2024-01-01T12:00:01Z","message":{{"role":"assistant","content":[{{"type":"text","text":"partial"}}]}}}}"#,
            i
        ));
        lines.push(format!(
            r#"{{"type":"assistant","uuid":"a{}","timestamp":"2024-01-01T12:00:01Z","message":{{"role":"assistant","content":[{{"type":"thinking","thinking":"plan"}},{{"type":"text","text":"Answer {}"}},{{"type":"tool_use","id":"t{}","name":"Read","input":{{"file_path":"src/lib.rs"}}}}]}}}}"#,
            i, i, i
        ));
    }
    fs::write(project_dir.join(format!("{}.jsonl", SESSION)), lines.join("\n")).unwrap();
    root
}

/// Generate N single-session rollout files spread over date shards
fn generate_codex_rollouts(num_files: usize) -> TempDir {
    let root = TempDir::new().unwrap();
    for i in 0..num_files {
        let day = format!("{:02}", i % 28 + 1);
        let shard = root.path().join("sessions").join("2024").join("01").join(day);
        fs::create_dir_all(&shard).unwrap();
        let meta = format!(
            r#"{{"type":"session_meta","timestamp":"2024-01-01T12:00:00Z","payload":{{"id":"s{}","cwd":"/bench/p{}"}}}}"#,
            i,
            i % 10
        );
        let prompt = r#"{"type":"event_msg","timestamp":"2024-01-01T12:00:01Z","payload":{"type":"user_message","message":"hello"}}"#;
        let content = format!("{}\n{}", meta, prompt);
        fs::write(shard.join(format!("rollout-{:06}.jsonl", i)), content).unwrap();
    }
    root
}

fn bench_claude_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("claude_list_messages");

    for size in [100, 1_000, 10_000].iter() {
        let root = generate_claude_session(*size);
        let provider = ClaudeProvider::new(root.path());

        group.throughput(Throughput::Elements(*size as u64 * 3));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| provider.list_messages(black_box(PROJECT), black_box(SESSION)).into_items());
        });
    }

    group.finish();
}

fn bench_codex_scans(c: &mut Criterion) {
    let mut group = c.benchmark_group("codex_scans");

    for size in [100, 1_000].iter() {
        let root = generate_codex_rollouts(*size);
        let provider = CodexProvider::codex(root.path());
        let project_id = encode_cwd("/bench/p0");

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("projects", size), size, |b, _| {
            b.iter(|| provider.list_projects().into_items());
        });
        group.bench_with_input(BenchmarkId::new("sessions", size), size, |b, _| {
            b.iter(|| provider.list_sessions(black_box(&project_id)).into_items());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_claude_messages, bench_codex_scans);
criterion_main!(benches);
