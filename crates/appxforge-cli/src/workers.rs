use std::sync::mpsc::{channel, Receiver};
use std::thread;

use appxforge_core::{PackageEntity, Texts};
use appxforge_host::enumerate;
use appxforge_pipeline::{PipelineRun, Toolchain};

pub enum PackEvent {
    Log(String),
    Finished(bool),
}

// Subprocess execution stays off the calling thread: enumeration and
// packaging each get one dedicated worker, never more than one of each.
pub fn run_enumeration(texts: Texts) -> Vec<PackageEntity> {
    let (sender, receiver) = channel();
    let worker = thread::spawn(move || {
        let _ = sender.send(enumerate(&texts));
    });
    let entities = receiver.recv().unwrap_or_default();
    let _ = worker.join();
    entities
}

pub fn spawn_packaging(
    run: PipelineRun,
    toolchain: Toolchain,
    texts: Texts,
) -> Receiver<PackEvent> {
    let (sender, receiver) = channel();
    thread::spawn(move || {
        let log_sender = sender.clone();
        let mut log = move |line: &str| {
            let _ = log_sender.send(PackEvent::Log(line.to_string()));
        };
        let outcome = run.run(&toolchain, &texts, &mut log);
        let _ = sender.send(PackEvent::Finished(outcome));
    });
    receiver
}
