//! Feed a session by hand and print the stable weight.

use weigh_core::mocks::ManualFrameSource;
use weigh_core::ReadSession;
use weigh_traits::protocol::frame_payload;

fn main() -> eyre::Result<()> {
    let mut session = ReadSession::builder()
        .with_source(ManualFrameSource::new())
        .with_stable_count(3)
        .build()?;
    session.open()?;

    let pending = session.start();
    for field in ["48.2", "49.9", "50.0", "50.0", "50.0"] {
        session.source().push(&frame_payload(field));
    }
    println!("stable weight: {}", pending.wait()?);
    session.close()?;
    Ok(())
}
