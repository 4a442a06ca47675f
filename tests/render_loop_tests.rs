use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mudterm::{
    CommandClient, CommandReply, CrosstermScreen, FrameStream, InMemoryTransport,
    InputStateMachine, Mode, RenderLoop, Session, SharedSession, Shutdown, Transport, ViewFetcher,
    Viewport, LEGEND,
};

fn render_loop(transport: &InMemoryTransport) -> (SharedSession, RenderLoop<Vec<u8>>) {
    let session = SharedSession::new(Session::new("foo", Viewport { width: 8, height: 5 }));
    let render = RenderLoop::new(
        session.clone(),
        ViewFetcher::new(Arc::new(transport.clone())),
        Vec::new(),
        Duration::from_millis(5),
    );
    (session, render)
}

fn output(render: &RenderLoop<Vec<u8>>) -> String {
    String::from_utf8(render.writer().clone()).expect("non utf8 output")
}

#[tokio::test]
async fn test_frame_lines_get_carriage_returns() {
    let transport = InMemoryTransport::new();
    transport.set_frame("line1\nline2\n");
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();

    let out = output(&render);
    assert!(out.starts_with("\x1b[1;1H"));
    assert!(out.contains("line1\r\nline2\r\n========\r\n"));
    assert!(out.contains(&format!(" {}\r\n", LEGEND)));
    assert!(out.ends_with(" \r\n>"));
}

#[tokio::test]
async fn test_view_request_carries_user_and_viewport() {
    let transport = InMemoryTransport::new();
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();

    assert_eq!(
        transport.view_requests(),
        vec![("foo".to_string(), Viewport { width: 8, height: 5 })]
    );
}

#[tokio::test]
async fn test_view_request_uses_session_user() {
    let transport = InMemoryTransport::new();
    let session = SharedSession::new(Session::new("bob", Viewport { width: 3, height: 2 }));
    let mut render = RenderLoop::new(
        session,
        ViewFetcher::new(Arc::new(transport.clone())),
        Vec::new(),
        Duration::from_millis(5),
    );

    render.render_tick().await.unwrap();

    assert_eq!(
        transport.view_requests(),
        vec![("bob".to_string(), Viewport { width: 3, height: 2 })]
    );
}

#[tokio::test]
async fn test_footer_reflects_console_and_previous_command() {
    let transport = InMemoryTransport::new();
    let (session, mut render) = render_loop(&transport);
    session.update(|s| {
        s.record_previous("look (ok)".to_string());
        s.enter_console();
        s.push_char('g');
        s.push_char('o');
    });

    render.render_tick().await.unwrap();

    assert!(output(&render).ends_with(" look (ok)\r\n>:go"));
}

#[tokio::test]
async fn test_connection_lost_is_shown_and_loop_recovers() {
    let transport = InMemoryTransport::new();
    transport.disconnect();
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();
    let out = output(&render);
    assert!(out.contains("Server Connection Lost - connection refused\r\n"));
    assert!(out.ends_with(">"));

    render.writer_mut().clear();
    transport.set_frame("back\n");
    render.render_tick().await.unwrap();
    let out = output(&render);
    assert!(out.contains("back\r\n"));
    assert!(!out.contains("Connection Lost"));
}

#[tokio::test]
async fn test_multibyte_text_split_across_chunks() {
    let transport = InMemoryTransport::new();
    transport.set_chunk_size(1);
    transport.set_frame("h\u{e9}llo \u{2591}\n");
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();

    assert!(output(&render).contains("h\u{e9}llo \u{2591}\r\n"));
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let transport = InMemoryTransport::new();
    transport.set_frame(vec![b'a', 0xff, b'b', b'\n']);
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();

    assert!(output(&render).contains("a\u{fffd}b\r\n"));
}

#[tokio::test]
async fn test_broken_stream_ends_frame() {
    let transport = InMemoryTransport::new();
    transport.set_broken_frame("partial");
    let (_session, mut render) = render_loop(&transport);

    render.render_tick().await.unwrap();

    let out = output(&render);
    assert!(out.contains("partial========"));
    assert!(out.ends_with(">"));
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let transport = InMemoryTransport::new();
    transport.set_frame("tick\n");
    let (_session, render) = render_loop(&transport);
    let shutdown = Shutdown::new();

    let task = tokio::spawn(render.run(shutdown.clone()));
    tokio::time::timeout(Duration::from_secs(2), async {
        while transport.view_requests().len() < 3 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("render loop did not tick");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("render loop did not stop")
        .unwrap();
}

/// Transport whose frames take a while to arrive; records how many overlap.
#[derive(Default)]
struct SlowTransport {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    views: AtomicUsize,
}

struct OneChunk(Option<Vec<u8>>);

#[async_trait::async_trait]
impl FrameStream for OneChunk {
    async fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.0.take())
    }
}

#[async_trait::async_trait]
impl Transport for SlowTransport {
    async fn command(&self, _user_id: &str, _key: &str) -> anyhow::Result<CommandReply> {
        Ok(CommandReply::ok())
    }

    async fn view(
        &self,
        _user_id: &str,
        _viewport: Viewport,
    ) -> anyhow::Result<Box<dyn FrameStream>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.views.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(OneChunk(Some(b"room\n".to_vec()))))
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_frames_never_overlap_while_input_runs() {
    let transport = Arc::new(SlowTransport::default());
    let session = SharedSession::new(Session::new("foo", Viewport { width: 8, height: 5 }));
    let shutdown = Shutdown::new();
    let out = SharedBuf::default();

    let render = RenderLoop::new(
        session.clone(),
        ViewFetcher::new(transport.clone()),
        out.clone(),
        Duration::from_millis(2),
    );
    let render_task = tokio::spawn(render.run(shutdown.clone()));

    let input = InputStateMachine::new(
        session.clone(),
        CommandClient::new(transport.clone(), "foo"),
        Arc::new(CrosstermScreen),
        shutdown.clone(),
    );
    for _ in 0..20 {
        for &byte in b":a;" {
            input.handle_byte(byte).await;
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), render_task)
        .await
        .expect("render loop did not stop")
        .unwrap();

    assert!(transport.views.load(Ordering::SeqCst) >= 1);
    assert_eq!(transport.peak.load(Ordering::SeqCst), 1);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.previous_command, "a (ok)");
    assert_eq!(snapshot.mode, Mode::Normal);
    assert_eq!(snapshot.command_buffer, "");

    let out = String::from_utf8(out.0.lock().unwrap().clone()).expect("non utf8 output");
    let last_footer = out.rsplit(LEGEND).next().unwrap();
    assert!(last_footer.starts_with("\r\n a (ok)\r\n>"));
}
