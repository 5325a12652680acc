//! A solver-independent description of a linear or mixed-integer problem.
//!
//! Variables and constraints are collected here while the factory is compiled, then handed to
//! HiGHS in one go. Objective coefficients may be added to a variable at any point, which lets
//! several components put costs on the same flow.
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::{debug, info};

/// A handle to a variable (column) of a [`Problem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(usize);

impl Var {
    /// Position of the variable in the solution vector
    pub fn index(self) -> usize {
        self.0
    }
}

/// The definition of a variable to be optimised.
///
/// The variable takes values between `min` and `max` and contributes `coefficient * x` to the
/// objective.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub coefficient: f64,
    /// Whether the variable must take an integer value
    pub is_integer: bool,
}

/// A constraint of the form `min <= a1*x1 + a2*x2 + ... <= max`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// The minimum value for the constraint
    pub min: f64,
    /// The maximum value for the constraint
    pub max: f64,
    /// The variables in the constraint with their coefficients
    pub terms: Vec<(Var, f64)>,
}

/// Solver settings forwarded to HiGHS
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Wall-clock limit for the solver in seconds
    pub max_solver_time: Option<f64>,
    /// Algorithm used by the solver ("choose", "simplex" or "ipm")
    pub solver_method: String,
    /// Optimality tolerance of the interior point method
    pub barrier_tolerance: Option<f64>,
    /// Relative gap at which the MIP search stops
    pub mip_gap: Option<f64>,
    /// Whether to show the solver's own log
    pub log_solver: bool,
    /// Values closer to zero than this are reported as zero
    pub result_epsilon: f64,
    /// Number of decimal places results are rounded to
    pub result_decimals: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_solver_time: None,
            solver_method: "choose".into(),
            barrier_tolerance: None,
            mip_gap: None,
            log_solver: false,
            result_epsilon: 1e-6,
            result_decimals: 6,
        }
    }
}

/// How a solve ended
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// An optimal solution was found, with one value per variable
    Optimal(Vec<f64>),
    /// The solver ran out of time
    TimeLimitReached,
}

/// A minimisation problem under construction
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Problem {
    variables: Vec<VariableDefinition>,
    constraints: Vec<Constraint>,
    is_nonconvex: bool,
}

impl Problem {
    /// Add a continuous variable
    pub fn add_var(&mut self, min: f64, max: f64) -> Var {
        self.push_var(min, max, false)
    }

    /// Add a variable which must take an integer value
    pub fn add_integer_var(&mut self, min: f64, max: f64) -> Var {
        self.push_var(min, max, true)
    }

    /// Add a variable which is either 0 or 1
    pub fn add_binary_var(&mut self) -> Var {
        self.push_var(0.0, 1.0, true)
    }

    fn push_var(&mut self, min: f64, max: f64, is_integer: bool) -> Var {
        debug_assert!(min <= max, "Invalid bounds [{min}, {max}]");
        self.variables.push(VariableDefinition {
            min,
            max,
            coefficient: 0.0,
            is_integer,
        });

        Var(self.variables.len() - 1)
    }

    /// Add a fixed variable
    pub fn add_fixed_var(&mut self, value: f64) -> Var {
        self.add_var(value, value)
    }

    /// Add `coefficient * var` to the objective
    pub fn add_cost(&mut self, var: Var, coefficient: f64) {
        self.variables[var.0].coefficient += coefficient;
    }

    /// Add a constraint `min <= Σ terms <= max`
    pub fn add_row(&mut self, min: f64, max: f64, terms: Vec<(Var, f64)>) {
        self.constraints.push(Constraint { min, max, terms });
    }

    /// Add a constraint `Σ terms == rhs`
    pub fn add_eq(&mut self, terms: Vec<(Var, f64)>, rhs: f64) {
        self.add_row(rhs, rhs, terms);
    }

    /// Add a constraint `Σ terms <= rhs`
    pub fn add_le(&mut self, terms: Vec<(Var, f64)>, rhs: f64) {
        self.add_row(f64::NEG_INFINITY, rhs, terms);
    }

    /// Add a constraint `Σ terms >= rhs`
    pub fn add_ge(&mut self, terms: Vec<(Var, f64)>, rhs: f64) {
        self.add_row(rhs, f64::INFINITY, terms);
    }

    /// Record that a non-convex relation had to be linearised
    pub fn mark_nonconvex(&mut self) {
        self.is_nonconvex = true;
    }

    /// Whether the problem contains a linearised non-convex relation
    pub fn is_nonconvex(&self) -> bool {
        self.is_nonconvex
    }

    /// Whether any variable must take an integer value
    pub fn is_mip(&self) -> bool {
        self.variables.iter().any(|var| var.is_integer)
    }

    /// Number of variables
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// The definition of a variable
    pub fn variable(&self, var: Var) -> &VariableDefinition {
        &self.variables[var.0]
    }

    /// The objective value of a solution
    pub fn objective_value(&self, solution: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(solution)
            .map(|(var, value)| var.coefficient * value)
            .sum()
    }

    /// Minimise the objective with HiGHS.
    ///
    /// A time limit is not an error: it is reported as [`SolveOutcome::TimeLimitReached`].
    pub fn solve(&self, options: &SolverOptions) -> Result<SolveOutcome> {
        let mut problem = RowProblem::default();
        let columns: Vec<_> = self
            .variables
            .iter()
            .map(|var| {
                if var.is_integer {
                    problem.add_integer_column(var.coefficient, var.min..=var.max)
                } else {
                    problem.add_column(var.coefficient, var.min..=var.max)
                }
            })
            .collect();
        for constraint in &self.constraints {
            problem.add_row(
                constraint.min..=constraint.max,
                constraint
                    .terms
                    .iter()
                    .map(|(var, coefficient)| (columns[var.0], *coefficient)),
            );
        }

        info!(
            "Solving {} with {} variables and {} constraints",
            if self.is_mip() { "MIP" } else { "LP" },
            self.num_vars(),
            self.num_constraints()
        );
        if self.is_nonconvex {
            info!("Non-convex efficiency curves have been linearised piecewise");
        }

        let mut model = problem.optimise(Sense::Minimise);
        apply_options(&mut model, options);

        let solved = model
            .try_solve()
            .map_err(|status| anyhow!("The solver failed to run: {status:?}"))?;
        match solved.status() {
            HighsModelStatus::Optimal => {
                let values = solved.get_solution().columns().to_vec();
                debug!("Objective value: {}", self.objective_value(&values));
                Ok(SolveOutcome::Optimal(values))
            }
            HighsModelStatus::ReachedTimeLimit => Ok(SolveOutcome::TimeLimitReached),
            status => Err(anyhow!("Could not solve: {status:?}")),
        }
    }
}

/// Forward solver options to HiGHS
fn apply_options(model: &mut highs::Model, options: &SolverOptions) {
    model.set_option("output_flag", options.log_solver);
    model.set_option("log_to_console", options.log_solver);
    model.set_option("solver", options.solver_method.as_str());
    if let Some(time_limit) = options.max_solver_time {
        model.set_option("time_limit", time_limit);
    }
    if let Some(tolerance) = options.barrier_tolerance {
        model.set_option("ipm_optimality_tolerance", tolerance);
    }
    if let Some(gap) = options.mip_gap {
        model.set_option("mip_rel_gap", gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_costs_accumulate() {
        let mut problem = Problem::default();
        let x = problem.add_var(0.0, 10.0);
        problem.add_cost(x, 1.0);
        problem.add_cost(x, 2.5);
        assert_eq!(problem.variable(x).coefficient, 3.5);
        assert_eq!(problem.objective_value(&[2.0]), 7.0);
    }

    #[test]
    fn test_solve_lp() {
        // minimise x + 2y subject to x + y >= 3, y >= 1
        let mut problem = Problem::default();
        let x = problem.add_var(0.0, f64::INFINITY);
        let y = problem.add_var(1.0, f64::INFINITY);
        problem.add_cost(x, 1.0);
        problem.add_cost(y, 2.0);
        problem.add_ge(vec![(x, 1.0), (y, 1.0)], 3.0);
        assert!(!problem.is_mip());

        let SolveOutcome::Optimal(values) = problem.solve(&SolverOptions::default()).unwrap()
        else {
            panic!("Expected an optimal solution");
        };
        assert_approx_eq!(f64, values[x.index()], 2.0, epsilon = 1e-7);
        assert_approx_eq!(f64, values[y.index()], 1.0, epsilon = 1e-7);
        assert_approx_eq!(f64, problem.objective_value(&values), 4.0, epsilon = 1e-7);
    }

    #[test]
    fn test_solve_mip() {
        // minimise -x subject to 2x <= 5, x integer
        let mut problem = Problem::default();
        let x = problem.add_integer_var(0.0, 10.0);
        problem.add_cost(x, -1.0);
        problem.add_le(vec![(x, 2.0)], 5.0);
        assert!(problem.is_mip());

        let SolveOutcome::Optimal(values) = problem.solve(&SolverOptions::default()).unwrap()
        else {
            panic!("Expected an optimal solution");
        };
        assert_approx_eq!(f64, values[x.index()], 2.0, epsilon = 1e-7);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = Problem::default();
        let x = problem.add_var(0.0, 1.0);
        problem.add_ge(vec![(x, 1.0)], 2.0);
        assert!(problem.solve(&SolverOptions::default()).is_err());
    }
}
