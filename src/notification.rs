//! Transient toast messages

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use crate::dom::{Document, NodeId, SharedDocument, lock};

/// Append a toast to the content container and remove it after `duration`.
///
/// The removal task is detached: it belongs to the page, not to whoever
/// showed the toast, so closing the picker does not cut it short.
pub fn show_notification<D: Document>(
    doc: &SharedDocument<D>,
    runtime: &Handle,
    message: &str,
    class: &str,
    duration: Duration,
) -> NodeId {
    let toast = {
        let mut doc = lock(doc);
        let toast = doc.create_element("div");
        doc.add_class(toast, class);
        doc.set_text(toast, message);
        let body = doc.body();
        doc.append_child(body, toast);
        toast
    };
    debug!("Showing notification {:?} for {:?}", message, duration);

    let doc = doc.clone();
    runtime.spawn(async move {
        tokio::time::sleep(duration).await;
        lock(&doc).remove(toast);
        debug!("Notification removed");
    });

    toast
}
