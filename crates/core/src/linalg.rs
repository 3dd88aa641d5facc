//! Small dense linear solves shared by the shooting solvers.

/// Solve J · x = r for the correction step of a Newton iteration.
///
/// Square systems use Gaussian elimination with partial pivoting;
/// over-determined systems (rows > cols) fall back to the normal equations
/// JᵀJ x = Jᵀr; under-determined systems return the minimum-norm solution
/// x = Jᵀ(JJᵀ)⁻¹ r. Returns `None` for singular or empty systems.
pub fn solve_linear_system(j: &[Vec<f64>], r: &[f64]) -> Option<Vec<f64>> {
    let m = j.len();
    if m == 0 || j[0].is_empty() || r.len() != m {
        return None;
    }
    let n = j[0].len();

    if m == n {
        solve_square(j.to_vec(), r.to_vec())
    } else if m > n {
        // Normal equations: JᵀJ x = Jᵀr.
        let mut jtj = vec![vec![0.0; n]; n];
        let mut jtr = vec![0.0; n];
        for i in 0..n {
            for jj in 0..n {
                for k in 0..m {
                    jtj[i][jj] += j[k][i] * j[k][jj];
                }
            }
            for k in 0..m {
                jtr[i] += j[k][i] * r[k];
            }
        }
        solve_square(jtj, jtr)
    } else {
        // Minimum-norm: solve (JJᵀ) y = r, then x = Jᵀ y.
        let mut jjt = vec![vec![0.0; m]; m];
        for i in 0..m {
            for jj in 0..m {
                for k in 0..n {
                    jjt[i][jj] += j[i][k] * j[jj][k];
                }
            }
        }
        let y = solve_square(jjt, r.to_vec())?;
        let mut x = vec![0.0; n];
        for (k, xk) in x.iter_mut().enumerate() {
            for i in 0..m {
                *xk += j[i][k] * y[i];
            }
        }
        Some(x)
    }
}

fn solve_square(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    // Forward elimination with partial pivoting.
    for k in 0..n {
        let mut max_row = k;
        let mut max_val = a[k][k].abs();
        for i in (k + 1)..n {
            if a[i][k].abs() > max_val {
                max_val = a[i][k].abs();
                max_row = i;
            }
        }
        if max_val < 1.0e-300 {
            return None;
        }
        a.swap(k, max_row);
        b.swap(k, max_row);

        for i in (k + 1)..n {
            let factor = a[i][k] / a[k][k];
            for jj in k..n {
                a[i][jj] -= factor * a[k][jj];
            }
            b[i] -= factor * b[k];
        }
    }

    // Back substitution.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for jj in (i + 1)..n {
            sum -= a[i][jj] * x[jj];
        }
        x[i] = sum / a[i][i];
    }
    Some(x)
}
