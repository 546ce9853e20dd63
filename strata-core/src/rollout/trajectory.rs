//! Transitions and trajectories.

/// A transition `(o_t, a_t, r_t, o_t+1, done_t)` of one environment.
///
/// Fields are fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    obs: Vec<f32>,
    act: Vec<f32>,
    reward: f32,
    next_obs: Vec<f32>,
    is_done: bool,
}

impl Transition {
    /// Constructs a transition.
    pub fn new(
        obs: Vec<f32>,
        act: Vec<f32>,
        reward: f32,
        next_obs: Vec<f32>,
        is_done: bool,
    ) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            is_done,
        }
    }

    /// Observation `o_t`.
    pub fn obs(&self) -> &[f32] {
        &self.obs
    }

    /// Action `a_t`.
    pub fn act(&self) -> &[f32] {
        &self.act
    }

    /// Reward `r_t`.
    pub fn reward(&self) -> f32 {
        self.reward
    }

    /// Observation `o_t+1` returned by the environment step.
    ///
    /// When the step ended an episode this is the last observation of that
    /// episode, not the initial observation of the next one.
    pub fn next_obs(&self) -> &[f32] {
        &self.next_obs
    }

    /// If the step ended an episode.
    pub fn is_done(&self) -> bool {
        self.is_done
    }
}

/// Time-ordered transitions collected from a single environment slot.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    env_ix: usize,
    transitions: Vec<Transition>,
    episode_returns: Vec<f32>,
}

impl Trajectory {
    /// Constructs an empty trajectory for environment slot `env_ix`.
    pub fn new(env_ix: usize) -> Self {
        Self {
            env_ix,
            transitions: Vec::new(),
            episode_returns: Vec::new(),
        }
    }

    /// Constructs a trajectory from transitions.
    pub fn from_transitions(env_ix: usize, transitions: Vec<Transition>) -> Self {
        Self {
            env_ix,
            transitions,
            episode_returns: Vec::new(),
        }
    }

    /// Appends a transition at the end.
    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Records the cumulative reward of an episode which ended in this trajectory.
    pub fn push_episode_return(&mut self, r: f32) {
        self.episode_returns.push(r);
    }

    /// Index of the environment slot.
    pub fn env_ix(&self) -> usize {
        self.env_ix
    }

    /// The transitions in time order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Cumulative rewards of episodes completed while the trajectory was collected.
    pub fn episode_returns(&self) -> &[f32] {
        &self.episode_returns
    }

    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if there is no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
