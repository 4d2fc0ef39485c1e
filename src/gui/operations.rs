use tokio::sync::mpsc;

use ambatudonlod::{ClientConfig, DownloadForm, FlowEvent, SubmissionFlow, VideoLookup};

#[derive(Debug)]
pub enum OperationMessage {
    Flow(FlowEvent),
    LookedUp(VideoLookup),
    Finished { success: bool },
}

/// Helper function to send operation messages with proper error handling
///
/// If the send fails, it logs the error. This can happen if the receiver has been dropped,
/// which typically occurs when the GUI has been closed or the operation was cancelled.
fn send_message(sender: &mpsc::UnboundedSender<OperationMessage>, msg: OperationMessage) {
    if let Err(e) = sender.send(msg) {
        log::warn!("Failed to send operation message: {:?}. Receiver may have been dropped.", e);
    }
}

/// Forward flow events to the GUI channel until the flow is dropped.
fn forward_events(
    mut events: mpsc::UnboundedReceiver<FlowEvent>,
    sender: mpsc::UnboundedSender<OperationMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            send_message(&sender, OperationMessage::Flow(event));
        }
    })
}

fn build_flow(
    config: ClientConfig,
    linger: bool,
    sender: &mpsc::UnboundedSender<OperationMessage>,
) -> Option<(SubmissionFlow, tokio::task::JoinHandle<()>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    match SubmissionFlow::new(config, tx) {
        Ok(flow) => {
            let forward = forward_events(rx, sender.clone());
            Some((flow.with_linger(linger), forward))
        }
        Err(e) => {
            send_message(sender, OperationMessage::Flow(FlowEvent::Message(e.user_message())));
            None
        }
    }
}

pub struct Operation;

impl Operation {
    pub async fn lookup(
        config: ClientConfig,
        url: String,
        sender: mpsc::UnboundedSender<OperationMessage>,
    ) {
        let Some((flow, forward)) = build_flow(config, false, &sender) else {
            send_message(&sender, OperationMessage::Finished { success: false });
            return;
        };

        let result = flow.lookup(&url).await;
        drop(flow);
        let _ = forward.await;

        match result {
            Ok(found) => send_message(&sender, OperationMessage::LookedUp(found)),
            Err(_) => send_message(&sender, OperationMessage::Finished { success: false }),
        }
    }

    pub async fn download(
        config: ClientConfig,
        form: DownloadForm,
        sender: mpsc::UnboundedSender<OperationMessage>,
    ) {
        let Some((flow, forward)) = build_flow(config, true, &sender) else {
            send_message(&sender, OperationMessage::Finished { success: false });
            return;
        };

        let result = flow.download(&form).await;
        drop(flow);
        let _ = forward.await;

        send_message(&sender, OperationMessage::Finished {
            success: result.is_ok(),
        });
    }
}
