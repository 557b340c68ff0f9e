use async_trait::async_trait;
use oto_dispatch::{deliver, Outbound, PresentError, Presenter, RecordingPresenter};
use oto_types::ActorId;

fn text(body: &str) -> Outbound {
    Outbound::Text {
        actor: ActorId::new(9),
        text: body.to_string(),
    }
}

/// Fails on every reply whose text contains "fail".
struct PickyPresenter {
    inner: RecordingPresenter,
}

#[async_trait]
impl Presenter for PickyPresenter {
    async fn render(&self, outbound: &Outbound) -> Result<(), PresentError> {
        if outbound.text().contains("fail") {
            return Err(PresentError::Transport("chat not found".to_string()));
        }
        self.inner.render(outbound).await
    }
}

#[tokio::test]
async fn deliver_renders_in_order() {
    let presenter = RecordingPresenter::new();
    let replies = vec![text("one"), text("two")];
    assert_eq!(deliver(&presenter, &replies).await, 2);
    assert_eq!(presenter.take(), replies);
    assert!(presenter.take().is_empty());
}

#[tokio::test]
async fn render_failure_skips_only_that_reply() {
    let presenter = PickyPresenter {
        inner: RecordingPresenter::new(),
    };
    let replies = vec![text("one"), text("fail"), text("three")];
    assert_eq!(deliver(&presenter, &replies).await, 2);
    assert_eq!(presenter.inner.take(), vec![text("one"), text("three")]);
}

#[test]
fn present_error_messages() {
    assert_eq!(
        PresentError::Transport("down".into()).to_string(),
        "transport error: down"
    );
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
    assert!(matches!(PresentError::from(io), PresentError::Io(_)));
}
