//! Drives the codec and the session against a scripted in-memory server.

use std::sync::Arc;

use chrono::DateTime;
use courier_common::{
    ClientConfig, ComposerConfig, Disposition, Mail, MailAttachment, MailUser, SequentialIds,
    logging,
};
use courier_smtp::{
    ClientCommand, ClientSession, Composer, PendingReply, ServerResponse, SmtpCodec, SmtpError,
    plan,
};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio_util::codec::Framed;

#[derive(Debug, Default)]
struct Transcript {
    commands: Vec<String>,
    data: String,
}

/// Minimal server: greets, accepts everything and records what it received.
async fn scripted_server(stream: DuplexStream) -> Transcript {
    let mut stream = BufReader::new(stream);
    let mut transcript = Transcript::default();
    let mut in_data = false;

    stream
        .get_mut()
        .write_all(b"220 mx.example.com ESMTP\r\n")
        .await
        .unwrap();

    loop {
        let mut line = String::new();
        if stream.read_line(&mut line).await.unwrap() == 0 {
            break;
        }

        if in_data {
            if line == ".\r\n" {
                in_data = false;
                stream.get_mut().write_all(b"250 2.0.0 queued\r\n").await.unwrap();
            } else {
                transcript.data.push_str(&line);
            }
            continue;
        }

        let reply: &[u8] = if line.starts_with("EHLO") {
            b"250-mx.example.com\r\n250-8BITMIME\r\n250 SIZE 1000000\r\n"
        } else if line.starts_with("DATA") {
            in_data = true;
            b"354 End data with <CR><LF>.<CR><LF>\r\n"
        } else if line.starts_with("QUIT") {
            b"221 2.0.0 Bye\r\n"
        } else {
            b"250 2.1.0 OK\r\n"
        };

        transcript.commands.push(line.clone());
        stream.get_mut().write_all(reply).await.unwrap();

        if line.starts_with("QUIT") {
            break;
        }
    }

    transcript
}

fn ids() -> Arc<SequentialIds> {
    Arc::new(SequentialIds::new(
        DateTime::parse_from_rfc3339("2024-03-01T09:05:00+01:00").unwrap(),
    ))
}

#[tokio::test]
async fn test_full_transaction_over_framed() {
    logging::init();

    let (client, server) = tokio::io::duplex(64 * 1024);
    let server = tokio::spawn(scripted_server(server));

    let ids = ids();
    let config = ClientConfig {
        hostname: String::from("client.example.com"),
        ..ClientConfig::default()
    };
    let mail = Mail::builder(MailUser::named("Alice", "alice@example.com"))
        .to("bob@example.com")
        .cc("carol@example.com")
        .bcc("dave@example.com")
        .subject("Minutes")
        .text("Hello Bob")
        .attach(MailAttachment::new(
            "minutes.txt",
            "text/plain",
            Disposition::Attachment,
            b"1. Lunch".to_vec(),
        ))
        .build_with(ids.as_ref());

    let codec = SmtpCodec::new(Composer::new(ids.clone(), config.composer.clone()));
    let mut framed = Framed::new(client, codec);

    let greeting = framed.next().await.unwrap().unwrap();
    assert_eq!(greeting, [ServerResponse::new(220, "mx.example.com ESMTP")]);

    for command in plan(&mail, &config).unwrap() {
        framed.send(command).await.unwrap();
        let reply = framed.next().await.unwrap().unwrap();

        assert!(
            reply
                .iter()
                .all(|line| line.is_positive_completion() || line.is_positive_intermediate()),
            "{command} was rejected: {reply:?}"
        );

        if matches!(command, ClientCommand::Ehlo(_)) {
            assert_eq!(
                reply,
                [
                    ServerResponse::new(250, "mx.example.com"),
                    ServerResponse::new(250, "8BITMIME"),
                    ServerResponse::new(250, "SIZE 1000000"),
                ]
            );
        }
    }

    assert!(framed.next().await.is_none());

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript.commands,
        [
            "EHLO client.example.com\r\n",
            "MAIL FROM: <alice@example.com> BODY=8BITMIME\r\n",
            "RCPT TO: <bob@example.com>\r\n",
            "RCPT TO: <carol@example.com>\r\n",
            "RCPT TO: <dave@example.com>\r\n",
            "DATA\r\n",
            "QUIT\r\n",
        ]
    );
    assert!(transcript.data.contains("Subject: Minutes\r\n"));
    assert!(transcript.data.contains("Cc: carol@example.com\r\n"));
    assert!(!transcript.data.contains("dave@example.com"));
    assert!(transcript.data.contains("Hello Bob\r\n"));
    assert!(transcript.data.contains("MS4gTHVuY2g=\r\n"));
}

#[tokio::test]
async fn test_stream_ends_mid_reply() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut framed = Framed::new(client, SmtpCodec::default());

    server.write_all(b"221 By").await.unwrap();
    drop(server);

    assert_eq!(
        framed.next().await.unwrap(),
        Err(SmtpError::IncompleteMessage)
    );
}

async fn read_reply(
    session: &mut ClientSession,
    stream: &mut DuplexStream,
    mut reply: PendingReply,
) -> courier_smtp::Result<Vec<ServerResponse>> {
    let mut buffer = [0; 512];

    loop {
        if let Some(reply) = reply.try_reply() {
            return reply;
        }

        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            session.finish()?;
            return reply.await;
        }

        session.receive(&buffer[..read])?;
    }
}

#[tokio::test]
async fn test_session_over_fragmented_stream() {
    logging::init();

    let (mut client, mut server) = tokio::io::duplex(1024);
    let mut session = ClientSession::new(Composer::new(ids(), ComposerConfig::default()));

    let server = tokio::spawn(async move {
        let mut buffer = [0; 512];

        server.write_all(b"220 mx").await.unwrap();
        tokio::task::yield_now().await;
        server.write_all(b".example.com ready\r\n").await.unwrap();

        let read = server.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..read], b"EHLO client.example.com\r\n");
        server.write_all(b"250-mx.example.com\r\n250 HELP\r\n").await.unwrap();

        let read = server.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..read], b"QUIT\r\n");
        server.write_all(b"2x1 Bye\r\n").await.unwrap();
    });

    let greeting = session.expect_reply();
    assert_eq!(
        read_reply(&mut session, &mut client, greeting).await,
        Ok(vec![ServerResponse::new(220, "mx.example.com ready")])
    );

    let (bytes, reply) = session.send(ClientCommand::Ehlo("client.example.com")).unwrap();
    client.write_all(&bytes).await.unwrap();
    assert_eq!(
        read_reply(&mut session, &mut client, reply).await,
        Ok(vec![
            ServerResponse::new(250, "mx.example.com"),
            ServerResponse::new(250, "HELP"),
        ])
    );

    let (bytes, reply) = session.send(ClientCommand::Quit).unwrap();
    client.write_all(&bytes).await.unwrap();
    assert_eq!(
        read_reply(&mut session, &mut client, reply).await,
        Err(SmtpError::InvalidCode(b"2x1".to_vec()))
    );
    assert!(session.failure().is_some_and(SmtpError::is_fatal));

    server.await.unwrap();
}
