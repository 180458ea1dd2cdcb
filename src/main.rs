use chunked_deque::collections::chunked::Deque;
use chunked_deque::collections::chunked::deque::EmplaceError;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    // Run with RUST_LOG=chunked_deque=trace to watch the bucket index grow.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut deque = Deque::new();
    for i in 1..20 {
        deque.push_back(i);
    }
    deque.push_front(0);
    for _ in 0..4 {
        deque.pop_back();
    }
    info!(len = deque.len(), "{deque}");

    let result = deque.try_emplace_back(|| "sixteen".parse::<i32>());
    if let Err(EmplaceError::Construct(error)) = &result {
        info!(%error, len = deque.len(), "construction failed, deque unchanged");
    }

    let front = deque.cursor_front();
    let tail = deque.cursor_tail();
    info!(
        distance = tail - front,
        middle = ?(front + 8).read(),
        "cursors"
    );

    let mut copy = deque.clone();
    copy.insert(8, 100);
    copy.remove(0);
    info!("{copy:?}");
}
