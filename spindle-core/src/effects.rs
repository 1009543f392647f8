//! Effect routing - UI values to the host audio graph
//!
//! The host graph has a dry path through a low-pass tone filter and a wet
//! path through a feedback delay. This module only forwards two parameters
//! into it: the filter cutoff and the echo mix gain.

use crate::error::GraphError;
use std::fmt;

/// Lowest cutoff the tone control offers
pub const CUTOFF_MIN_HZ: f32 = 20.0;

/// Highest cutoff the tone control offers (and the graph default)
pub const CUTOFF_MAX_HZ: f32 = 8000.0;

/// Cutoffs at or above this read as "open"
pub const CUTOFF_OPEN_HZ: f32 = 7900.0;

/// Host audio graph (filter + feedback delay)
pub trait AudioGraph {
    /// Whether the graph has been built
    fn is_initialized(&self) -> bool;

    /// Build the graph if needed. Must be idempotent.
    fn initialize(&mut self) -> Result<(), GraphError>;

    /// Write the tone filter cutoff frequency
    fn set_cutoff_hz(&mut self, hz: f32);

    /// Write the echo mix gain (0.0 - 1.0)
    fn set_echo_mix(&mut self, mix: f32);
}

/// Parameters last written to the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub cutoff_hz: f32,
    pub echo_mix: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            cutoff_hz: CUTOFF_MAX_HZ,
            echo_mix: 0.0,
        }
    }
}

/// How the cutoff is shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffDisplay {
    Open,
    Hz(u32),
}

impl CutoffDisplay {
    pub fn from_hz(hz: f32) -> Self {
        if hz >= CUTOFF_OPEN_HZ {
            CutoffDisplay::Open
        } else {
            CutoffDisplay::Hz(hz.round().max(0.0) as u32)
        }
    }
}

impl fmt::Display for CutoffDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffDisplay::Open => write!(f, "open"),
            CutoffDisplay::Hz(hz) => write!(f, "{} Hz", hz),
        }
    }
}

/// Forwards tone and echo settings into the graph
#[derive(Debug, Clone, Default)]
pub struct EffectRouter {
    params: EffectParams,
}

impl EffectRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> EffectParams {
        self.params
    }

    /// Write the cutoff. No-op (returns false) before the graph exists.
    pub fn set_cutoff<G: AudioGraph + ?Sized>(&mut self, graph: &mut G, hz: f32) -> bool {
        if !graph.is_initialized() {
            return false;
        }
        self.params.cutoff_hz = hz;
        graph.set_cutoff_hz(hz);
        true
    }

    /// Write the echo mix. No-op (returns false) before the graph exists.
    pub fn set_echo_mix<G: AudioGraph + ?Sized>(&mut self, graph: &mut G, mix: f32) -> bool {
        if !graph.is_initialized() {
            return false;
        }
        self.params.echo_mix = mix.clamp(0.0, 1.0);
        graph.set_echo_mix(self.params.echo_mix);
        true
    }

    /// Push the remembered params into a freshly built graph
    pub fn sync<G: AudioGraph + ?Sized>(&self, graph: &mut G) {
        if graph.is_initialized() {
            graph.set_cutoff_hz(self.params.cutoff_hz);
            graph.set_echo_mix(self.params.echo_mix);
        }
    }

    pub fn cutoff_display(&self) -> CutoffDisplay {
        CutoffDisplay::from_hz(self.params.cutoff_hz)
    }

    /// Echo mix as a rounded percentage, e.g. "35%"
    pub fn echo_display(&self) -> String {
        format!("{}%", (self.params.echo_mix * 100.0).round() as u32)
    }
}

/// Audio graph that only records what it is told.
///
/// Stands in for the real graph in headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGraph {
    initialized: bool,
    fail_with: Option<String>,
    pub cutoff_hz: Option<f32>,
    pub echo_mix: Option<f32>,
    /// Number of successful `initialize` calls that built the graph
    pub builds: u32,
}

impl SimulatedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail with `reason` until cleared
    pub fn fail_initialize(&mut self, reason: Option<String>) {
        self.fail_with = reason;
    }
}

impl AudioGraph for SimulatedGraph {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self) -> Result<(), GraphError> {
        if self.initialized {
            return Ok(());
        }
        if let Some(reason) = &self.fail_with {
            return Err(GraphError(reason.clone()));
        }
        self.initialized = true;
        self.builds += 1;
        Ok(())
    }

    fn set_cutoff_hz(&mut self, hz: f32) {
        self.cutoff_hz = Some(hz);
    }

    fn set_echo_mix(&mut self, mix: f32) {
        self.echo_mix = Some(mix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_before_init_are_noops() {
        let mut graph = SimulatedGraph::new();
        let mut router = EffectRouter::new();
        assert!(!router.set_cutoff(&mut graph, 500.0));
        assert!(!router.set_echo_mix(&mut graph, 0.5));
        assert_eq!(graph.cutoff_hz, None);
        assert_eq!(graph.echo_mix, None);
        assert_eq!(router.params(), EffectParams::default());
    }

    #[test]
    fn test_writes_after_init_forward_verbatim() {
        let mut graph = SimulatedGraph::new();
        graph.initialize().unwrap();
        let mut router = EffectRouter::new();
        assert!(router.set_cutoff(&mut graph, 1234.5));
        assert!(router.set_echo_mix(&mut graph, 0.35));
        assert_eq!(graph.cutoff_hz, Some(1234.5));
        assert_eq!(graph.echo_mix, Some(0.35));
    }

    #[test]
    fn test_echo_mix_is_clamped() {
        let mut graph = SimulatedGraph::new();
        graph.initialize().unwrap();
        let mut router = EffectRouter::new();
        router.set_echo_mix(&mut graph, 1.7);
        assert_eq!(graph.echo_mix, Some(1.0));
        assert_eq!(router.echo_display(), "100%");
    }

    #[test]
    fn test_cutoff_display_policy() {
        assert_eq!(CutoffDisplay::from_hz(8000.0), CutoffDisplay::Open);
        assert_eq!(CutoffDisplay::from_hz(7900.0), CutoffDisplay::Open);
        assert_eq!(CutoffDisplay::from_hz(7899.4), CutoffDisplay::Hz(7899));
        assert_eq!(CutoffDisplay::from_hz(440.0).to_string(), "440 Hz");
        assert_eq!(CutoffDisplay::Open.to_string(), "open");
    }

    #[test]
    fn test_sync_pushes_params() {
        let mut graph = SimulatedGraph::new();
        let router = EffectRouter::new();
        router.sync(&mut graph);
        assert_eq!(graph.cutoff_hz, None);
        graph.initialize().unwrap();
        router.sync(&mut graph);
        assert_eq!(graph.cutoff_hz, Some(CUTOFF_MAX_HZ));
        assert_eq!(graph.echo_mix, Some(0.0));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut graph = SimulatedGraph::new();
        graph.initialize().unwrap();
        graph.initialize().unwrap();
        assert_eq!(graph.builds, 1);
    }
}
