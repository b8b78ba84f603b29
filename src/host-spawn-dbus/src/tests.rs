//! Transport tests against an in-process Flatpak helper over a socket pair.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use tokio::net::UnixStream;
use zbus::object_server::SignalContext;
use zbus::zvariant::OwnedFd;
use zbus::{Connection, Guid, connection};

use host_spawn_protocol::{
    ExitNotification, HostCommandRequest, HostCommandTransport, HostPid, StdioFds,
};

use crate::{DEVELOPMENT_OBJECT_PATH, FlatpakDevelopment};

/// What the helper received in a `HostCommand` call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceivedCall {
    cwd_path: Vec<u8>,
    argv: Vec<Vec<u8>>,
    fd_keys: Vec<u32>,
    envs: HashMap<String, String>,
    flags: u32,
}

#[derive(Clone, Default)]
struct FakeHelper {
    calls: Arc<Mutex<Vec<ReceivedCall>>>,
    signals: Arc<Mutex<Vec<(u32, u32, bool)>>>,
}

#[zbus::interface(name = "org.freedesktop.Flatpak.Development")]
impl FakeHelper {
    async fn host_command(
        &self,
        cwd_path: Vec<u8>,
        argv: Vec<Vec<u8>>,
        fds: HashMap<u32, OwnedFd>,
        envs: HashMap<String, String>,
        flags: u32,
    ) -> u32 {
        let mut fd_keys: Vec<u32> = fds.keys().copied().collect();
        fd_keys.sort_unstable();
        self.calls.lock().unwrap().push(ReceivedCall {
            cwd_path,
            argv,
            fd_keys,
            envs,
            flags,
        });
        42
    }

    async fn host_command_signal(&self, pid: u32, signal: u32, to_process_group: bool) {
        self.signals
            .lock()
            .unwrap()
            .push((pid, signal, to_process_group));
    }

    #[zbus(signal)]
    async fn host_command_exited(
        ctxt: &SignalContext<'_>,
        pid: u32,
        exit_status: u32,
    ) -> zbus::Result<()>;
}

/// A helper connection serving `helper` and a client connection to it.
async fn connected_pair(helper: FakeHelper) -> (Connection, Connection) {
    let (server_end, client_end) = UnixStream::pair().expect("socket pair");
    let server = connection::Builder::unix_stream(server_end)
        .server(Guid::generate())
        .expect("server guid")
        .p2p()
        .serve_at(DEVELOPMENT_OBJECT_PATH, helper)
        .expect("serve helper")
        .build();
    let client = connection::Builder::unix_stream(client_end).p2p().build();
    tokio::try_join!(server, client).expect("p2p handshake")
}

#[tokio::test]
async fn test_host_command_over_the_wire() {
    let helper = FakeHelper::default();
    let (server, client) = connected_pair(helper.clone()).await;
    let transport = FlatpakDevelopment::with_connection(&client)
        .await
        .expect("proxy");

    let mut exits = transport.subscribe_exits().await.expect("subscribe");

    let stdio = StdioFds::inherit().expect("dup stdio");
    let request =
        HostCommandRequest::new(Path::new("/home/user"), &["ls", "-la"], stdio).expect("request");
    let pid = transport.host_command(&request).await.expect("HostCommand");
    assert_eq!(pid, HostPid(42));

    assert_eq!(
        helper.calls.lock().unwrap().clone(),
        vec![ReceivedCall {
            cwd_path: b"/home/user\0".to_vec(),
            argv: vec![b"ls\0".to_vec(), b"-la\0".to_vec()],
            fd_keys: vec![0, 1, 2],
            envs: HashMap::from([("TERM".to_string(), "xterm-256color".to_string())]),
            flags: 0,
        }]
    );

    let ctxt = SignalContext::new(&server, DEVELOPMENT_OBJECT_PATH).expect("signal context");
    FakeHelper::host_command_exited(&ctxt, 42, 0)
        .await
        .expect("emit HostCommandExited");

    let exit = tokio::time::timeout(Duration::from_secs(5), exits.next())
        .await
        .expect("HostCommandExited within timeout");
    assert_eq!(exit, Some(ExitNotification::new(42, 0)));
}

#[tokio::test]
async fn test_signal_reaches_helper() {
    let helper = FakeHelper::default();
    let (_server, client) = connected_pair(helper.clone()).await;
    let transport = FlatpakDevelopment::with_connection(&client)
        .await
        .expect("proxy");

    transport
        .signal(HostPid(42), 15)
        .await
        .expect("HostCommandSignal");

    assert_eq!(helper.signals.lock().unwrap().clone(), vec![(42, 15, false)]);
}
