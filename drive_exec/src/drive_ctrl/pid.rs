//! PID controller for the heading hold loop.
//!
//! A standalone controller consumed by composition; it carries no lifecycle
//! of its own beyond its error history.

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Default, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_error: None
        }
    }

    /// Get the value of the controller for the given error.
    ///
    /// The control loop runs at a fixed period so the timestep is passed in
    /// rather than measured.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        // Accumulate the integral term.
        self.integral += error * dt_s;

        // Calculate the derivative. With no previous error the full error is
        // treated as the change over this timestep.
        let deriv = match self.prev_error {
            Some(e) => (error - e) / dt_s,
            None => error / dt_s
        };

        // Calculate the output
        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        // Remember the previous error
        self.prev_error = Some(error);

        // Return
        out
    }

    /// Clear the integral accumulation and error history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}
