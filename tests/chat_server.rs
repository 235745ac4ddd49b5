//! End-to-end chat server tests over real TCP sockets
//! Run with: cargo test --test chat_server

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use std::time::Duration;

use linechat::application::services::ChatHub;
use linechat::infrastructure::config::{Config, IdentityMode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

async fn start(identity: IdentityMode, window_ms: u64) -> (SocketAddr, Arc<ChatHub>) {
    ensure_init();

    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.identity = identity;
    config.security.rate_limit.window_ms = window_ms;

    let adapter = linechat::bind(&config).await.expect("bind");
    let addr = adapter.local_addr().expect("local addr");
    let hub = Arc::clone(adapter.hub());
    tokio::spawn(adapter.run());
    (addr, hub)
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Connect and wait until our own join notice has arrived
    async fn join(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client
            .wait_for(|l| l.contains(&format!("'{}' has been connected", name)))
            .await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("write");
    }

    async fn next(&mut self) -> Option<String> {
        timeout(Duration::from_secs(3), self.lines.next_line())
            .await
            .expect("server answered in time")
            .expect("read line")
    }

    async fn wait_for(&mut self, pred: impl Fn(&str) -> bool) -> String {
        loop {
            let line = self.next().await.expect("connection still open");
            if pred(&line) {
                return line;
            }
        }
    }
}

async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !check() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_greeting_lists_users_and_hints_help() {
    let (addr, _hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::connect(addr).await;

    assert_eq!(a.next().await.as_deref(), Some("<b>Currently connected: [Anonym1]</b>"));
    assert_eq!(
        a.next().await.as_deref(),
        Some("<b>Use the command \"\\help\" to get a list of all supported commands.</b>")
    );
    assert_eq!(
        a.next().await.as_deref(),
        Some("<b>New client 'Anonym1' has been connected to this server.</b>")
    );
}

#[tokio::test]
async fn test_setname_too_short_is_rejected() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;

    a.send("\\setname ab").await;
    assert_eq!(a.next().await.as_deref(), Some("Executing command 'setname'."));
    assert_eq!(
        a.next().await.as_deref(),
        Some("Your wanted name is too short. Minimum 3 characters are needed.")
    );
    assert_eq!(hub.sessions().active_names(), vec!["Anonym1".to_string()]);
}

#[tokio::test]
async fn test_second_setname_to_same_name_is_in_use() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;
    let mut b = Client::join(addr, "Anonym2").await;

    a.send("\\setname bob").await;
    a.wait_for(|l| l == "You've successfully changed your name.").await;
    b.wait_for(|l| l == "<b>The user 'Anonym1' changed their name to 'bob'.</b>")
        .await;

    b.send("\\setname bob").await;
    b.wait_for(|l| l == "Your wanted name is already in use.").await;

    let names: HashSet<_> = hub.sessions().active_names().into_iter().collect();
    assert_eq!(names, HashSet::from(["bob".to_string(), "Anonym2".to_string()]));
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;

    a.send(&"y".repeat(251)).await;
    assert_eq!(
        a.next().await.as_deref(),
        Some("Your message is too long. Maximum of 250 characters is allowed.")
    );
    assert_eq!(hub.log().len(), 0);
}

#[tokio::test]
async fn test_mention_renders_for_recipients_only() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;
    let mut b = Client::join(addr, "Anonym2").await;
    let mut c = Client::join(addr, "Anonym3").await;

    b.send("\\setname Bob").await;
    b.wait_for(|l| l == "You've successfully changed your name.").await;

    a.send("hello @Bob").await;

    let directed = "<b color=\"red\">Anonym1</b>:\t<u>hello @Bob</u>";
    let public = "<b color=\"red\">Anonym1</b>:\thello @Bob";
    assert_eq!(b.wait_for(|l| l.contains("hello @Bob")).await, directed);
    assert_eq!(c.wait_for(|l| l.contains("hello @Bob")).await, public);
    assert_eq!(a.wait_for(|l| l.contains("hello @Bob")).await, directed);

    let stored = hub.log().read_from(0).messages;
    assert_eq!(stored.len(), 1);
    let names: Vec<_> = stored[0].recipients.iter().map(|u| u.display_name()).collect();
    assert_eq!(names, vec!["Anonym1".to_string(), "Bob".to_string()]);
}

#[tokio::test]
async fn test_exit_broadcasts_and_closes() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;
    let mut b = Client::join(addr, "Anonym2").await;

    a.send("\\exit").await;
    a.wait_for(|l| l == "Closing the connection.").await;
    assert_eq!(a.next().await, None);

    b.wait_for(|l| l == "<b>The user 'Anonym1' has exited.</b>").await;
    eventually(|| hub.sessions().active_count() == 1).await;

    b.send("\\userlist").await;
    b.wait_for(|l| l == "<b>Currently connected: [Anonym2]</b>").await;
}

#[tokio::test]
async fn test_dropped_connection_announces_disconnect() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let a = Client::join(addr, "Anonym1").await;
    let mut b = Client::join(addr, "Anonym2").await;

    drop(a);
    b.wait_for(|l| l == "<b>The user 'Anonym1' has been disconnected from the server.</b>")
        .await;
    eventually(|| hub.sessions().active_count() == 1).await;
}

#[tokio::test]
async fn test_reconnect_from_same_address_rejoins() {
    let (addr, hub) = start(IdentityMode::PeerIp, 0).await;
    let mut first = Client::join(addr, "Anonym1").await;
    first.send("\\setname carol").await;
    first.wait_for(|l| l == "You've successfully changed your name.").await;
    first.send("before").await;
    first.wait_for(|l| l.ends_with("before")).await;
    drop(first);
    eventually(|| hub.sessions().active_count() == 0).await;

    let mut again = Client::connect(addr).await;
    // History is replayed from the start.
    again.wait_for(|l| l.ends_with("before")).await;
    again
        .wait_for(|l| l == "<b>Client 'carol' has reentered this server.</b>")
        .await;
}

#[tokio::test]
async fn test_lines_inside_debounce_window_are_dropped() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 200).await;
    let mut a = Client::join(addr, "Anonym1").await;

    a.writer.write_all(b"first\nsecond\n").await.expect("write");
    a.wait_for(|l| l.ends_with("first")).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.log().len(), 1);

    sleep(Duration::from_millis(250)).await;
    a.send("third").await;
    a.wait_for(|l| l.ends_with("third")).await;
    assert_eq!(hub.log().len(), 2);
}

#[tokio::test]
async fn test_concurrent_senders_lose_nothing() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let senders = 5;
    let per_sender = 20;

    let mut tasks = Vec::new();
    for s in 0..senders {
        let mut client = Client::connect(addr).await;
        tasks.push(tokio::spawn(async move {
            for i in 0..per_sender {
                client.send(&format!("msg-{}-{}", s, i)).await;
            }
            // Keep the connection open until every line is in.
            client.wait_for(|l| l.ends_with(&format!("msg-{}-{}", s, per_sender - 1))).await;
            client
        }));
    }

    let mut clients = Vec::new();
    for task in tasks {
        clients.push(task.await.expect("sender task"));
    }

    eventually(|| hub.log().len() == senders * per_sender).await;
    let contents: HashSet<_> = hub
        .log()
        .read_from(0)
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents.len(), senders * per_sender);
}

#[tokio::test]
async fn test_racing_renames_to_one_name_have_one_winner() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let racers = 8;

    let mut clients = Vec::new();
    for n in 1..=racers {
        clients.push(Client::join(addr, &format!("Anonym{}", n)).await);
    }

    let mut tasks = Vec::new();
    for (i, mut client) in clients.into_iter().enumerate() {
        // Alternate the case; uniqueness ignores it.
        let wanted = if i % 2 == 0 { "racer" } else { "RACER" };
        tasks.push(tokio::spawn(async move {
            client.send(&format!("\\setname {}", wanted)).await;
            let verdict = client
                .wait_for(|l| l == "You've successfully changed your name." || l == "Your wanted name is already in use.")
                .await;
            (client, verdict)
        }));
    }

    let mut winners = 0;
    let mut clients = Vec::new();
    for task in tasks {
        let (client, verdict) = task.await.expect("rename task");
        if verdict == "You've successfully changed your name." {
            winners += 1;
        }
        clients.push(client);
    }
    assert_eq!(winners, 1);

    let names = hub.sessions().active_names();
    let racer_names = names.iter().filter(|n| n.eq_ignore_ascii_case("racer")).count();
    assert_eq!(racer_names, 1);
    let unique: HashSet<_> = names.iter().map(|n| n.to_lowercase()).collect();
    assert_eq!(unique.len(), names.len());
}

#[tokio::test]
async fn test_line_without_newline_is_capped() {
    let (addr, hub) = start(IdentityMode::PeerSocket, 0).await;
    let mut a = Client::join(addr, "Anonym1").await;

    // Far past the default 4096-byte line cap.
    a.writer.write_all(&vec![b'q'; 64 * 1024]).await.expect("write");
    a.send("").await;
    a.wait_for(|l| l == "Your message is too long. Maximum of 250 characters is allowed.")
        .await;

    a.send("still here").await;
    a.wait_for(|l| l.ends_with("still here")).await;
    assert_eq!(hub.log().len(), 1);
}
