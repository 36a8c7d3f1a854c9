/// Logical simulation clock mapping tick counts to simulated time of day.
///
/// Ticks are fixed logical steps, decoupled from wall-clock time. The
/// hour of day is `start_hour + tick * tick_minutes / 60`, wrapped at 24.
///
/// # Examples
///
/// ```
/// use fleet_charge_sim::sim::clock::SimClock;
///
/// let mut clock = SimClock::new(30.0, 23.0);
/// assert_eq!(clock.tick(), 0);
/// assert_eq!(clock.tick(), 1);
/// assert_eq!(clock.current(), 2);
/// assert!((clock.hour_of_day() - 0.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Ticks completed so far.
    current: u64,
    /// Simulated minutes per tick.
    tick_minutes: f64,
    /// Hour of day at tick 0.
    start_hour: f64,
}

impl SimClock {
    /// Creates a clock at tick 0.
    ///
    /// # Arguments
    ///
    /// * `tick_minutes` - Simulated minutes per tick
    /// * `start_hour` - Hour of day at tick 0
    pub fn new(tick_minutes: f64, start_hour: f64) -> Self {
        Self {
            current: 0,
            tick_minutes,
            start_hour,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// The tick number before advancing.
    pub fn tick(&mut self) -> u64 {
        let step = self.current;
        self.current += 1;
        step
    }

    /// Number of ticks completed.
    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn tick_minutes(&self) -> f64 {
        self.tick_minutes
    }

    /// Hour of day, in `[0, 24)`, at the current tick.
    pub fn hour_of_day(&self) -> f64 {
        self.hour_at(self.current)
    }

    /// Hour of day, in `[0, 24)`, at an arbitrary tick.
    pub fn hour_at(&self, tick: u64) -> f64 {
        (self.start_hour + tick as f64 * self.tick_minutes / 60.0).rem_euclid(24.0)
    }
}
