//! # Point mass car
//!
//! Reference implementation of the `CarModel` interface. The car is treated as a point mass with
//! a single friction circle, aerodynamic downforce and drag, and an engine limited by both power
//! and traction. It is good enough to produce realistic speed profiles, it is not intended to be
//! a high fidelity vehicle model.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use track_if::car::{CarModel, Curvatures, TrackConditions};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Gravitational acceleration
pub const G_MS2: f64 = 9.81;

/// Maximum number of iterations in the braking and acceleration solvers.
const MAX_ITERATIONS: usize = 100;

/// Speed change below which the braking and acceleration solvers stop.
const CONVERGED_MS: f64 = 0.001;

/// Lowest speed used when dividing by speed.
const MIN_SPEED_MS: f64 = 0.1;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the point mass car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointMassCar {
    /// Mass of the car without fuel
    pub mass_kg: f64,

    /// Mass of fuel on board
    pub fuel_kg: f64,

    /// Tyre friction coefficient on a surface of friction 1.0
    pub mu: f64,

    /// Downforce coefficient, downforce is `ca * v^2` in Newtons
    pub ca: f64,

    /// Drag coefficient, drag is `cd * v^2` in Newtons
    pub cd: f64,

    /// Maximum engine power at the wheels
    pub power_w: f64,

    /// Maximum tractive force of the driven wheels
    pub max_traction_n: f64,

    /// Fraction of the available grip used while braking
    pub brake_grip: f64,

    /// Hard limit on speed
    pub top_speed_ms: f64,

    /// Overall width of the car
    pub width_m: f64,

    /// Scaling applied to the bump curvature when computing the vertical load
    pub kz_scale: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PointMassCar {
    fn default() -> Self {
        Self {
            mass_kg: 700.0,
            fuel_kg: 0.0,
            mu: 1.2,
            ca: 1.5,
            cd: 0.4,
            power_w: 400_000.0,
            max_traction_n: 9_000.0,
            brake_grip: 0.95,
            top_speed_ms: 85.0,
            width_m: 2.0,
            kz_scale: 1.0,
        }
    }
}

impl PointMassCar {
    /// Total mass including fuel.
    pub fn total_mass_kg(&self) -> f64 {
        (self.mass_kg + self.fuel_kg).max(1.0)
    }

    /// Add (or with a negative change remove) fuel, never going below empty.
    pub fn change_fuel(&mut self, change_kg: f64) {
        self.fuel_kg = (self.fuel_kg + change_kg).max(0.0);
    }

    /// Angle the track is banked towards the inside of a turn with curvature `k`.
    fn bank_rad(k: f64, cond: &TrackConditions) -> f64 {
        // A +ve roll raises the right side, which is the outside of a left (+ve) turn
        if k >= 0.0 {
            cond.roll_rad
        } else {
            -cond.roll_rad
        }
    }

    /// Extra vertical load per unit mass per unit speed squared due to the path's vertical shape.
    fn vertical_k(&self, curv: &Curvatures) -> f64 {
        self.kz_scale * curv.kz + curv.kv
    }

    /// Total grip available at the given speed.
    fn grip_n(&self, v: f64, curv: &Curvatures, cond: &TrackConditions) -> f64 {
        let m = self.total_mass_kg();
        let mu = self.mu * cond.friction;
        let bank = Self::bank_rad(curv.k, cond);

        let load = m * G_MS2 * bank.cos() * cond.pitch_rad.cos()
            + self.ca * v * v
            + m * v * v * self.vertical_k(curv);

        (mu * load).max(0.0)
    }

    /// Longitudinal force left over after cornering at the given speed.
    fn long_grip_n(&self, v: f64, curv: &Curvatures, cond: &TrackConditions) -> f64 {
        let m = self.total_mass_kg();
        let bank = Self::bank_rad(curv.k, cond);

        let grip = self.grip_n(v, curv, cond);
        let lat = (m * v * v * curv.k.abs() - m * G_MS2 * bank.sin()).abs();

        if lat >= grip {
            0.0
        } else {
            (grip * grip - lat * lat).sqrt()
        }
    }
}

impl CarModel for PointMassCar {
    fn width_m(&self) -> f64 {
        self.width_m
    }

    fn max_speed(&self, curv: Curvatures, cond: TrackConditions) -> f64 {
        let m = self.total_mass_kg();
        let mu = self.mu * cond.friction;
        let bank = Self::bank_rad(curv.k, &cond);

        // m v^2 |k| = mu (m g cos(bank) + ca v^2 + m v^2 kvert) + m g sin(bank)
        let num = m * G_MS2 * (mu * bank.cos() * cond.pitch_rad.cos() + bank.sin());
        let den = m * curv.k.abs() - mu * (self.ca + m * self.vertical_k(&curv));

        if den <= 1e-9 {
            return self.top_speed_ms;
        }

        (num.max(0.0) / den).sqrt().min(self.top_speed_ms)
    }

    fn braking(
        &self,
        from: Curvatures,
        to: Curvatures,
        target_speed_ms: f64,
        dist_m: f64,
        cond: TrackConditions,
    ) -> f64 {
        if dist_m <= 0.0 {
            return target_speed_ms;
        }

        let m = self.total_mass_kg();
        let mid = Curvatures::new(
            0.5 * (from.k + to.k),
            0.5 * (from.kz + to.kz),
            0.5 * (from.kv + to.kv),
        );

        let mut u = target_speed_ms;
        for _ in 0..MAX_ITERATIONS {
            let v = 0.5 * (u + target_speed_ms);

            let brake_n = self.brake_grip * self.long_grip_n(v, &mid, &cond);
            let decel = (brake_n + self.cd * v * v) / m + G_MS2 * cond.pitch_rad.sin();

            let u_sq = target_speed_ms * target_speed_ms + 2.0 * decel * dist_m;
            let u_new = u_sq.max(0.0).sqrt().max(target_speed_ms);

            let converged = (u_new - u).abs() < CONVERGED_MS;
            u = u_new;
            if converged {
                break;
            }
        }

        u
    }

    fn acceleration(
        &self,
        from: Curvatures,
        to: Curvatures,
        start_speed_ms: f64,
        dist_m: f64,
        cond: TrackConditions,
    ) -> f64 {
        if dist_m <= 0.0 {
            return start_speed_ms;
        }

        let m = self.total_mass_kg();
        let mid = Curvatures::new(
            0.5 * (from.k + to.k),
            0.5 * (from.kz + to.kz),
            0.5 * (from.kv + to.kv),
        );

        let mut v_end = start_speed_ms;
        for _ in 0..MAX_ITERATIONS {
            let v = (0.5 * (start_speed_ms + v_end)).max(MIN_SPEED_MS);

            let drive_n = (self.power_w / v)
                .min(self.max_traction_n)
                .min(self.long_grip_n(v, &mid, &cond));
            let accel = (drive_n - self.cd * v * v) / m - G_MS2 * cond.pitch_rad.sin();

            let v_sq = start_speed_ms * start_speed_ms + 2.0 * accel * dist_m;
            let v_new = v_sq.max(0.0).sqrt().min(self.top_speed_ms.max(start_speed_ms));

            let converged = (v_new - v_end).abs() < CONVERGED_MS;
            v_end = v_new;
            if converged {
                break;
            }
        }

        v_end
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_max_speed() {
        let car = PointMassCar::default();
        let flat = TrackConditions::flat(1.0);

        // Straights run at the speed cap
        assert_eq!(car.max_speed(Curvatures::default(), flat), car.top_speed_ms);

        // Tighter corners are slower, and curvature sign doesn't matter on flat ground
        let wide = car.max_speed(Curvatures::new(0.01, 0.0, 0.0), flat);
        let tight = car.max_speed(Curvatures::new(0.05, 0.0, 0.0), flat);
        let tight_right = car.max_speed(Curvatures::new(-0.05, 0.0, 0.0), flat);
        assert!(tight < wide);
        assert!((tight - tight_right).abs() < 1e-12);

        // The lateral force balance holds at the limit
        let k = 0.05;
        let m = car.total_mass_kg();
        let lhs = m * tight * tight * k;
        let rhs = car.mu * (m * G_MS2 + car.ca * tight * tight);
        assert!((lhs - rhs).abs() < 1e-6 * lhs);

        // Less grip is slower, banking into the turn is faster
        assert!(car.max_speed(Curvatures::new(0.05, 0.0, 0.0), TrackConditions::flat(0.8)) < tight);
        let banked = TrackConditions {
            friction: 1.0,
            roll_rad: 0.1,
            pitch_rad: 0.0,
        };
        assert!(car.max_speed(Curvatures::new(0.05, 0.0, 0.0), banked) > tight);
        assert!(car.max_speed(Curvatures::new(-0.05, 0.0, 0.0), banked) < tight);
    }

    #[test]
    fn test_braking_and_acceleration() {
        let car = PointMassCar::default();
        let flat = TrackConditions::flat(1.0);
        let straight = Curvatures::default();

        let entry = car.braking(straight, straight, 30.0, 10.0, flat);
        assert!(entry > 30.0);
        assert!(car.braking(straight, straight, 30.0, 20.0, flat) > entry);
        assert_eq!(car.braking(straight, straight, 30.0, 0.0, flat), 30.0);

        // Cornering uses grip which would otherwise be used for braking
        let corner = Curvatures::new(0.02, 0.0, 0.0);
        assert!(car.braking(corner, corner, 30.0, 10.0, flat) < entry);

        let exit = car.acceleration(straight, straight, 30.0, 10.0, flat);
        assert!(exit > 30.0);
        assert!(exit < entry);
        assert!(car.acceleration(straight, straight, 84.99, 50.0, flat) <= car.top_speed_ms);

        // Standing starts still move
        assert!(car.acceleration(straight, straight, 0.0, 5.0, flat) > 0.0);
    }

    #[test]
    fn test_fuel() {
        let mut car = PointMassCar::default();
        car.change_fuel(50.0);
        assert_eq!(car.total_mass_kg(), 750.0);
        car.change_fuel(-80.0);
        assert_eq!(car.fuel_kg, 0.0);
    }
}
