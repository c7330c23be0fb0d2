use crate::error::Result;
use crate::traits::{DynamicalSystem, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Rk4 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }
}

impl Steppable for Rk4 {
    fn step(
        &mut self,
        system: &impl DynamicalSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()> {
        let t0 = *t;
        let half = 0.5 * dt;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1)?;

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half * self.k1[i];
        }
        system.apply(t0 + half, &self.tmp, &mut self.k2)?;

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half * self.k2[i];
        }
        system.apply(t0 + half, &self.tmp, &mut self.k3)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4)?;

        for i in 0..state.len() {
            state[i] += dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Butcher tableau of an explicit embedded Runge-Kutta pair.
///
/// `a` is stored row by row, row `i` holding the coefficients of stage
/// `i + 1`. `e` holds the difference between the propagating weights `b` and
/// the embedded lower-order weights.
pub struct Tableau {
    pub c: &'static [f64],
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
    pub e: &'static [f64],
    /// Order of the embedded (error) solution.
    pub error_order: u32,
}

pub const CASH_KARP_54: Tableau = Tableau {
    c: &[0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0],
    a: &[
        &[1.0 / 5.0],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0],
        &[-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0],
        &[
            1631.0 / 55296.0,
            175.0 / 512.0,
            575.0 / 13824.0,
            44275.0 / 110592.0,
            253.0 / 4096.0,
        ],
    ],
    b: &[37.0 / 378.0, 0.0, 250.0 / 621.0, 125.0 / 594.0, 0.0, 512.0 / 1771.0],
    e: &[
        37.0 / 378.0 - 2825.0 / 27648.0,
        0.0,
        250.0 / 621.0 - 18575.0 / 48384.0,
        125.0 / 594.0 - 13525.0 / 55296.0,
        -277.0 / 14336.0,
        512.0 / 1771.0 - 1.0 / 4.0,
    ],
    error_order: 4,
};

pub const DORMAND_PRINCE_5: Tableau = Tableau {
    c: &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0],
    a: &[
        &[1.0 / 5.0],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0],
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
        &[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
        ],
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
    e: &[
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ],
    error_order: 4,
};

pub const TSITOURAS_5: Tableau = Tableau {
    c: &[0.0, 0.161, 0.327, 0.9, 0.9800255409045097, 1.0, 1.0],
    a: &[
        &[0.161],
        &[-0.008480655492356989, 0.335480655492357],
        &[2.897153057105493, -6.359448489975075, 4.3622954328695815],
        &[
            5.325864828439257,
            -11.748883564062828,
            7.4955393428898365,
            -0.09249506636175525,
        ],
        &[
            5.86145544294642,
            -12.92096931784711,
            8.159367898576159,
            -0.071584973281401,
            -0.028269050394068383,
        ],
        &[
            0.09646076681806523,
            0.01,
            0.4798896504144996,
            1.379008574103742,
            -3.290069515436081,
            2.324710524099774,
        ],
    ],
    b: &[
        0.09646076681806523,
        0.01,
        0.4798896504144996,
        1.379008574103742,
        -3.290069515436081,
        2.324710524099774,
        0.0,
    ],
    e: &[
        -0.00178001105222577714,
        -0.0008164344596567469,
        0.007880878010261995,
        -0.1447110071732629,
        0.5823571654525552,
        -0.45808210592918697,
        0.015151515151515152,
    ],
    error_order: 4,
};

/// Explicit embedded Runge-Kutta stepper driven by a [`Tableau`].
///
/// Every step leaves the local error estimate of the last step in
/// [`EmbeddedRungeKutta::error`]; accepting or rejecting the step is up to
/// the caller.
pub struct EmbeddedRungeKutta {
    tableau: &'static Tableau,
    k: Vec<Vec<f64>>,
    tmp: Vec<f64>,
    error: Vec<f64>,
}

impl EmbeddedRungeKutta {
    pub fn new(tableau: &'static Tableau, dim: usize) -> Self {
        Self {
            tableau,
            k: vec![vec![0.0; dim]; tableau.c.len()],
            tmp: vec![0.0; dim],
            error: vec![0.0; dim],
        }
    }

    /// Local error estimate of the last step.
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    /// Exponent applied to the scaled error norm by step size control.
    pub fn error_exponent(&self) -> f64 {
        1.0 / f64::from(self.tableau.error_order + 1)
    }
}

impl Steppable for EmbeddedRungeKutta {
    fn step(
        &mut self,
        system: &impl DynamicalSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()> {
        let t0 = *t;
        let tableau = self.tableau;

        system.apply(t0, state, &mut self.k[0])?;

        for (stage, row) in tableau.a.iter().enumerate() {
            for i in 0..state.len() {
                let increment: f64 = row
                    .iter()
                    .zip(&self.k)
                    .map(|(a, k)| a * k[i])
                    .sum();
                self.tmp[i] = state[i] + dt * increment;
            }
            system.apply(t0 + tableau.c[stage + 1] * dt, &self.tmp, &mut self.k[stage + 1])?;
        }

        for i in 0..state.len() {
            let mut increment = 0.0;
            let mut error = 0.0;
            for (stage, k) in self.k.iter().enumerate() {
                increment += tableau.b[stage] * k[i];
                error += tableau.e[stage] * k[i];
            }
            state[i] += dt * increment;
            self.error[i] = dt * error;
        }

        *t = t0 + dt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Harmonic oscillator x'' = -x.
    struct Oscillator;

    impl DynamicalSystem for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
            out[0] = x[1];
            out[1] = -x[0];
            Ok(())
        }
    }

    fn integrate(stepper: &mut impl Steppable, dt: f64, steps: usize) -> (f64, [f64; 2]) {
        let mut t = 0.0;
        let mut state = [1.0, 0.0];
        for _ in 0..steps {
            stepper.step(&Oscillator, &mut t, &mut state, dt).unwrap();
        }
        (t, state)
    }

    #[test]
    fn rk4_tracks_the_oscillator() {
        let (t, state) = integrate(&mut Rk4::new(2), 0.01, 100);
        assert!((t - 1.0).abs() < 1e-12);
        assert!((state[0] - 1.0_f64.cos()).abs() < 1e-9);
        assert!((state[1] + 1.0_f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn tableaus_are_consistent() {
        for tableau in [&CASH_KARP_54, &DORMAND_PRINCE_5, &TSITOURAS_5] {
            assert_eq!(tableau.a.len() + 1, tableau.c.len());
            assert_eq!(tableau.b.len(), tableau.c.len());
            assert_eq!(tableau.e.len(), tableau.c.len());
            assert!((tableau.b.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            // Both weight sets integrate constants exactly.
            assert!(tableau.e.iter().sum::<f64>().abs() < 1e-12);
            for (row, c) in tableau.a.iter().zip(&tableau.c[1..]) {
                assert!((row.iter().sum::<f64>() - c).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn embedded_pairs_are_fifth_order_accurate() {
        for tableau in [&CASH_KARP_54, &DORMAND_PRINCE_5, &TSITOURAS_5] {
            let mut stepper = EmbeddedRungeKutta::new(tableau, 2);
            let (_, state) = integrate(&mut stepper, 0.05, 20);
            assert!((state[0] - 1.0_f64.cos()).abs() < 1e-8);
            assert!((state[1] + 1.0_f64.sin()).abs() < 1e-8);

            let local_error = stepper.error().iter().fold(0.0_f64, |acc, e| acc.max(e.abs()));
            assert!(local_error > 0.0 && local_error < 1e-7);
        }
    }

    #[test]
    fn backward_step_retraces_forward_step() {
        let mut stepper = EmbeddedRungeKutta::new(&DORMAND_PRINCE_5, 2);
        let mut t = 0.0;
        let mut state = [1.0, 0.0];
        stepper.step(&Oscillator, &mut t, &mut state, 0.1).unwrap();
        stepper.step(&Oscillator, &mut t, &mut state, -0.1).unwrap();
        assert!(t.abs() < 1e-15);
        assert!((state[0] - 1.0).abs() < 1e-9);
        assert!(state[1].abs() < 1e-9);
    }
}
