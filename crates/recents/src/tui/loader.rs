//! Background task data loading for the preview.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use recents_core::{Bitmap, Task, TaskData, TaskId};
use recents_stack::TaskDataSource;

struct LoadRequest {
    id: TaskId,
    package: String,
    component: String,
}

/// Task data source backed by a worker thread. Results are picked up with
/// [`DataLoader::poll`] on the UI thread.
pub struct DataLoader {
    requests: Sender<LoadRequest>,
    results: Receiver<(TaskId, TaskData)>,
    wanted: HashSet<TaskId>,
}

impl DataLoader {
    pub fn spawn(latency: Duration) -> Self {
        let (requests, request_rx) = mpsc::channel::<LoadRequest>();
        let (result_tx, results) = mpsc::channel();

        thread::spawn(move || {
            for request in request_rx {
                thread::sleep(latency);
                let data = decode(&request);
                if result_tx.send((request.id, data)).is_err() {
                    break;
                }
            }
        });

        Self {
            requests,
            results,
            wanted: HashSet::new(),
        }
    }

    /// Finished loads for tasks whose cards are still showing.
    pub fn poll(&mut self) -> Vec<(TaskId, TaskData)> {
        self.results
            .try_iter()
            .filter(|(id, _)| self.wanted.remove(id))
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.wanted.len()
    }
}

impl TaskDataSource for DataLoader {
    fn load_data(&mut self, task: &Task) {
        if !self.wanted.insert(task.id) {
            return;
        }
        let request = LoadRequest {
            id: task.id,
            package: task.content.package.clone(),
            component: task.content.component.clone(),
        };
        if self.requests.send(request).is_err() {
            self.wanted.remove(&task.id);
        }
    }

    fn unload_data(&mut self, task: &Task) {
        self.wanted.remove(&task.id);
    }

    fn delete_data(&mut self, task: &Task) {
        self.wanted.remove(&task.id);
    }
}

fn decode(request: &LoadRequest) -> TaskData {
    let name = request
        .package
        .rsplit('.')
        .next()
        .unwrap_or(&request.package);
    let mut title = String::new();
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        title.extend(first.to_uppercase());
        title.push_str(chars.as_str());
    }
    if request.component != "main" {
        title.push_str(" · ");
        title.push_str(&request.component);
    }

    TaskData {
        title: Some(title),
        icon: None,
        thumbnail: Some(Bitmap::new(1, 1, accent(&request.package).to_vec())),
    }
}

/// Stable RGB accent derived from the package name.
pub fn accent(package: &str) -> [u8; 3] {
    let hash = package
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = hash.to_le_bytes();
    [r / 2 + 64, g / 2 + 64, b / 2 + 64]
}
