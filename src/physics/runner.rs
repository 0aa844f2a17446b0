use super::body::{Pose, RigidBody};
use super::error::{PhysicsError, Result};
use super::handle::BodyHandle;
use super::snapshot::WorldSnapshot;
use super::world::{CancelToken, PhysicsWorld, StepReport};
use crate::math::Vector3;
use bevy::log::{debug, info};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

type Reply<T> = Sender<T>;

/// Requests executed on the runner thread, in the order they were sent.
pub enum WorldCommand {
    Initialize {
        gravity: Vector3,
        reply: Reply<Result<()>>,
    },
    AddBody {
        body: RigidBody,
        reply: Reply<BodyHandle>,
    },
    RemoveBody {
        handle: BodyHandle,
        reply: Reply<Result<RigidBody>>,
    },
    Step {
        delta_time: f32,
        max_sub_steps: u32,
        reply: Reply<Result<StepReport>>,
    },
    ApplyForce {
        handle: BodyHandle,
        force: Vector3,
        offset: Option<Vector3>,
        reply: Reply<Result<()>>,
    },
    ApplyImpulse {
        handle: BodyHandle,
        impulse: Vector3,
        offset: Option<Vector3>,
        reply: Reply<Result<()>>,
    },
    SetPose {
        handle: BodyHandle,
        pose: Pose,
        reply: Reply<Result<()>>,
    },
    SetPaused(bool),
    Snapshot {
        reply: Reply<WorldSnapshot>,
    },
    /// Arbitrary access to the world on its own thread.
    Run(Box<dyn FnOnce(&mut PhysicsWorld) + Send>),
    Shutdown,
}

/// Confines a [`PhysicsWorld`] to a dedicated thread.
///
/// Callers talk to the world through blocking request methods. Every
/// successful step also publishes an `Arc<WorldSnapshot>` for readers that
/// only want the newest state, such as a render loop.
pub struct SimulationRunner {
    commands: Sender<WorldCommand>,
    snapshots: Receiver<Arc<WorldSnapshot>>,
    cancel: CancelToken,
    thread: Option<JoinHandle<PhysicsWorld>>,
}

impl SimulationRunner {
    pub fn spawn(world: PhysicsWorld) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        // Holds at most the newest unread snapshot
        let (snapshot_tx, snapshot_rx) = crossbeam_channel::bounded(1);
        let cancel = world.cancel_token();

        let slot = LatestSlot {
            tx: snapshot_tx,
            rx: snapshot_rx.clone(),
        };
        let thread = std::thread::spawn(move || run(world, command_rx, slot));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel,
            thread: Some(thread),
        }
    }

    fn send(&self, command: WorldCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PhysicsError::RunnerDisconnected)
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> WorldCommand) -> Result<T> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.send(command(reply_tx))?;
        reply_rx.recv().map_err(|_| PhysicsError::RunnerDisconnected)
    }

    pub fn initialize(&self, gravity: Vector3) -> Result<()> {
        self.request(|reply| WorldCommand::Initialize { gravity, reply })?
    }

    pub fn add_rigid_body(&self, body: RigidBody) -> Result<BodyHandle> {
        self.request(|reply| WorldCommand::AddBody { body, reply })
    }

    pub fn remove_rigid_body(&self, handle: BodyHandle) -> Result<RigidBody> {
        self.request(|reply| WorldCommand::RemoveBody { handle, reply })?
    }

    /// Blocks until the step has finished. A paused runner reports zero
    /// sub-steps.
    pub fn step_simulation(&self, delta_time: f32, max_sub_steps: u32) -> Result<StepReport> {
        self.request(|reply| WorldCommand::Step {
            delta_time,
            max_sub_steps,
            reply,
        })?
    }

    pub fn apply_force(
        &self,
        handle: BodyHandle,
        force: Vector3,
        offset: Option<Vector3>,
    ) -> Result<()> {
        self.request(|reply| WorldCommand::ApplyForce {
            handle,
            force,
            offset,
            reply,
        })?
    }

    pub fn apply_impulse(
        &self,
        handle: BodyHandle,
        impulse: Vector3,
        offset: Option<Vector3>,
    ) -> Result<()> {
        self.request(|reply| WorldCommand::ApplyImpulse {
            handle,
            impulse,
            offset,
            reply,
        })?
    }

    pub fn set_pose(&self, handle: BodyHandle, pose: Pose) -> Result<()> {
        self.request(|reply| WorldCommand::SetPose {
            handle,
            pose,
            reply,
        })?
    }

    pub fn set_paused(&self, paused: bool) -> Result<()> {
        self.send(WorldCommand::SetPaused(paused))
    }

    /// Fresh snapshot, ordered after every previously sent command.
    pub fn snapshot(&self) -> Result<WorldSnapshot> {
        self.request(|reply| WorldCommand::Snapshot { reply })
    }

    /// Newest snapshot published since the last call, if any.
    pub fn latest_snapshot(&self) -> Option<Arc<WorldSnapshot>> {
        let mut latest = None;
        // keep only the latest snapshot
        while let Ok(snapshot) = self.snapshots.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Runs `f` against the world on the runner thread and returns its result.
    pub fn with_world<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut PhysicsWorld) -> R + Send + 'static,
    {
        self.request(|reply: Sender<R>| {
            WorldCommand::Run(Box::new(move |world| {
                let _ = reply.send(f(world));
            }))
        })
    }

    /// Cancels the step in progress, or the next one if none is running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops the thread and returns the world it owned.
    pub fn shutdown(mut self) -> Result<PhysicsWorld> {
        let _ = self.commands.send(WorldCommand::Shutdown);
        self.thread
            .take()
            .ok_or(PhysicsError::RunnerDisconnected)?
            .join()
            .map_err(|_| PhysicsError::RunnerDisconnected)
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(WorldCommand::Shutdown);
            let _ = thread.join();
        }
    }
}

/// Single-slot publisher: a new snapshot replaces one nobody has read yet.
struct LatestSlot {
    tx: Sender<Arc<WorldSnapshot>>,
    rx: Receiver<Arc<WorldSnapshot>>,
}

impl LatestSlot {
    fn publish(&self, snapshot: Arc<WorldSnapshot>) {
        if let Err(TrySendError::Full(snapshot)) = self.tx.try_send(snapshot) {
            let _ = self.rx.try_recv();
            // Only this thread sends, so the slot is free now
            let _ = self.tx.try_send(snapshot);
        }
    }
}

fn run(
    mut world: PhysicsWorld,
    commands: Receiver<WorldCommand>,
    snapshots: LatestSlot,
) -> PhysicsWorld {
    info!("Simulation runner started with {} bodies", world.body_count());
    let mut paused = false;

    for command in commands.iter() {
        match command {
            WorldCommand::Initialize { gravity, reply } => {
                let _ = reply.send(world.initialize(gravity));
            }
            WorldCommand::AddBody { body, reply } => {
                let _ = reply.send(world.add_rigid_body(body));
            }
            WorldCommand::RemoveBody { handle, reply } => {
                let _ = reply.send(world.remove_rigid_body(handle));
            }
            WorldCommand::Step {
                delta_time,
                max_sub_steps,
                reply,
            } => {
                let result = if paused {
                    Ok(StepReport {
                        sub_steps: 0,
                        sub_step_size: world.sub_step(),
                        contacts: 0,
                    })
                } else {
                    world.step_simulation(delta_time, max_sub_steps)
                };
                if result.is_ok() && !paused {
                    snapshots.publish(Arc::new(world.snapshot()));
                }
                let _ = reply.send(result);
            }
            WorldCommand::ApplyForce {
                handle,
                force,
                offset,
                reply,
            } => {
                let _ = reply.send(world.apply_force(handle, force, offset));
            }
            WorldCommand::ApplyImpulse {
                handle,
                impulse,
                offset,
                reply,
            } => {
                let _ = reply.send(world.apply_impulse(handle, impulse, offset));
            }
            WorldCommand::SetPose {
                handle,
                pose,
                reply,
            } => {
                let _ = reply.send(world.set_pose(handle, pose));
            }
            WorldCommand::SetPaused(value) => {
                debug!("Simulation runner paused: {}", value);
                paused = value;
            }
            WorldCommand::Snapshot { reply } => {
                let _ = reply.send(world.snapshot());
            }
            WorldCommand::Run(f) => f(&mut world),
            WorldCommand::Shutdown => break,
        }
    }

    info!(
        "Simulation runner stopped after {} steps",
        world.step_count()
    );
    world
}
