use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

pub fn basic(engine: &Type) -> TokenStream {
    quote! {
        #[test]
        fn build_destroy() {
            let _solver = satbridge::solvers::Solver::<#engine>::default();
        }

        #[test]
        fn build_two() {
            let _solver1 = satbridge::solvers::Solver::<#engine>::default();
            let _solver2 = satbridge::solvers::Solver::<#engine>::default();
        }

        #[test]
        fn fresh_state() {
            use satbridge::solvers::{SearchPhase, SearchStats, Solver};

            let solver = Solver::<#engine>::default();
            assert!(solver.is_ok().unwrap());
            assert_eq!(solver.stats().unwrap(), SearchStats::default());
            assert_eq!(solver.n_vars().unwrap(), 0);
            assert_eq!(solver.search_phase(), SearchPhase::Idle);
        }

        #[test]
        fn zero_literal() {
            use satbridge::{solvers::{Solver, SolverError}, types::TypeError};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            assert_eq!(
                solver.add_clause(&[0]),
                Err(SolverError::Type(TypeError::IpasirZero))
            );
            assert!(solver.is_ok().unwrap());
        }

        #[test]
        fn unallocated_variable() {
            use satbridge::solvers::{Solver, SolverError};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            assert_eq!(
                solver.add_clause(&[1, 2]),
                Err(SolverError::InvalidVariable { var: 1, n_vars: 1 })
            );
            assert_eq!(
                solver.value(u32::MAX),
                Err(SolverError::InvalidVariable { var: u32::MAX, n_vars: 1 })
            );
            assert!(matches!(
                solver.add_clause(&[i32::MIN]),
                Err(SolverError::InvalidVariable { n_vars: 1, .. })
            ));
            assert!(solver.is_ok().unwrap());
        }

        #[test]
        fn stats() {
            use satbridge::{lit, var, solvers::Solver};

            let solver = Solver::<#engine>::default();
            for _ in 0..10 {
                solver.new_var().unwrap();
            }
            for idx in 0..9 {
                solver.add_binary(lit![idx], !lit![idx + 1]).unwrap();
            }

            let stats = solver.solve_stats().unwrap();
            assert_eq!(stats.n_solves(), 0);
            assert_eq!(stats.n_clauses, 9);
            assert_eq!(stats.max_var, Some(var![9]));
            assert!((stats.avg_clause_len - 2.).abs() < f32::EPSILON);

            let _ = solver.solve().unwrap().wait().unwrap();

            let stats = solver.solve_stats().unwrap();
            assert_eq!(stats.n_sat, 1);
            assert_eq!(stats.n_unsat, 0);
            assert_eq!(stats.n_terminated, 0);
            assert_eq!(stats.n_solves(), 1);
        }

        #[tokio::test]
        async fn tiny_instance_sat() {
            use satbridge::{solvers::{Solver, SolverResult}, types::TernaryVal};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            solver.new_var().unwrap();
            solver.add_clause(&[1, 2]).unwrap();
            solver.add_clause(&[-1, -2]).unwrap();
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Sat);
            let v0 = solver.value(0).unwrap();
            let v1 = solver.value(1).unwrap();
            assert_ne!(v0, TernaryVal::DontCare);
            assert_ne!(v1, TernaryVal::DontCare);
            assert_eq!(v0, !v1);
            let model = solver.model().unwrap();
            assert!(model.satisfies(&[satbridge::lit![0], satbridge::lit![1]]));
            assert!(model.satisfies(&[!satbridge::lit![0], !satbridge::lit![1]]));
        }

        #[tokio::test]
        async fn tiny_instance_unsat() {
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            solver.add_clause(&[1]).unwrap();
            solver.add_clause(&[-1]).unwrap();
            assert!(!solver.is_ok().unwrap());
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Unsat);
        }

        #[tokio::test]
        async fn chain_unsat() {
            use satbridge::{lit, solvers::{Solver, SolverResult}};

            let solver = Solver::<#engine>::default();
            for _ in 0..3 {
                solver.new_var().unwrap();
            }
            solver.add_unit(!lit![0]).unwrap();
            solver.add_binary(lit![0], !lit![1]).unwrap();
            solver.add_binary(lit![1], !lit![2]).unwrap();
            solver.add_unit(lit![2]).unwrap();
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Unsat);
        }

        #[tokio::test]
        async fn stale_interrupt() {
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            solver.new_var().unwrap();
            solver.add_clause(&[1, -2]).unwrap();
            solver.interrupt();
            let res = solver.solve().unwrap().await.unwrap();
            assert_eq!(res, SolverResult::Sat);
        }

        #[tokio::test]
        async fn assumptions() {
            use satbridge::{lit, solvers::{Solver, SolverResult}};

            let solver = Solver::<#engine>::default();
            for _ in 0..3 {
                solver.new_var().unwrap();
            }
            solver.add_clause(&[-1, 2]).unwrap();
            solver.add_clause(&[-2, 3]).unwrap();
            let res = solver.solve_assumps(&[1, -3]).unwrap().await.unwrap();
            assert_eq!(res, SolverResult::Unsat);
            assert!(solver.is_ok().unwrap());
            let core = solver.core().unwrap();
            assert!(!core.is_empty());
            assert!(core.iter().all(|&l| l == !lit![0] || l == lit![2]));
            let res = solver.solve_assumps(&[1]).unwrap().await.unwrap();
            assert_eq!(res, SolverResult::Sat);
            assert_eq!(solver.value(2).unwrap().to_option(), Some(true));
        }

        #[tokio::test]
        async fn incremental() {
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            solver.new_var().unwrap();
            solver.new_var().unwrap();
            solver.add_clause(&[1, 2]).unwrap();
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Sat);
            solver.add_clause(&[-1]).unwrap();
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Sat);
            assert_eq!(solver.value(1).unwrap().to_option(), Some(true));
            solver.add_clause(&[-2]).unwrap();
            assert_eq!(solver.solve().unwrap().await.unwrap(), SolverResult::Unsat);
            assert!(!solver.is_ok().unwrap());
        }

        #[tokio::test]
        async fn stats_monotonic() {
            use satbridge::solvers::Solver;

            let solver = Solver::<#engine>::default();
            for _ in 0..6 {
                solver.new_var().unwrap();
            }
            solver.add_clause(&[1, 2, 3]).unwrap();
            solver.add_clause(&[-1, 4]).unwrap();
            solver.add_clause(&[-2, 5, -6]).unwrap();
            solver.add_clause(&[-4, -5, 6]).unwrap();
            let mut last = solver.stats().unwrap();
            for assumps in [[1, -5], [-1, 6], [2, -4]] {
                solver.solve_assumps(&assumps).unwrap().await.unwrap();
                let now = solver.stats().unwrap();
                assert!(now.restarts >= last.restarts);
                assert!(now.conflicts >= last.conflicts);
                assert!(now.decisions >= last.decisions);
                assert!(now.propagations >= last.propagations);
                last = now;
            }
        }
    }
}

pub fn interrupt(engine: &Type) -> TokenStream {
    quote! {
        /// Pigeonhole principle with one pigeon more than there are holes
        fn pigeonhole(solver: &satbridge::solvers::Solver<#engine>, holes: i32) {
            let pigeons = holes + 1;
            for _ in 0..pigeons * holes {
                solver.new_var().unwrap();
            }
            let var = |pigeon: i32, hole: i32| pigeon * holes + hole + 1;
            for pigeon in 0..pigeons {
                let clause: Vec<_> = (0..holes).map(|hole| var(pigeon, hole)).collect();
                solver.add_clause(&clause).unwrap();
            }
            for hole in 0..holes {
                for p1 in 0..pigeons {
                    for p2 in p1 + 1..pigeons {
                        solver.add_clause(&[-var(p1, hole), -var(p2, hole)]).unwrap();
                    }
                }
            }
        }

        #[tokio::test]
        async fn interrupt_long_search() {
            use std::time::Duration;
            use satbridge::solvers::{SearchPhase, Solver, SolverError, SolverResult};

            let _ = env_logger::builder().is_test(true).try_init();
            let solver = Solver::<#engine>::default();
            pigeonhole(&solver, 11);
            let task = solver.solve().unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(matches!(solver.solve(), Err(SolverError::SearchInProgress)));
            assert_eq!(solver.add_clause(&[1]), Err(SolverError::SearchInProgress));
            solver.interrupt();
            assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
            assert_eq!(solver.search_phase(), SearchPhase::Idle);
            assert!(solver.is_ok().unwrap());
            solver.add_clause(&[1, 2]).unwrap();
            assert!(solver.is_ok().unwrap());
            assert_eq!(solver.solve_stats().unwrap().n_terminated, 1);
        }

        #[tokio::test]
        async fn interrupt_from_other_task() {
            use std::time::Duration;
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            pigeonhole(&solver, 11);
            let interrupter = solver.interrupter();
            let task = solver.solve().unwrap();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                interrupter.interrupt();
            });
            assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
        }

        #[tokio::test]
        async fn drop_handle_during_search() {
            use std::time::Duration;
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            pigeonhole(&solver, 11);
            let interrupter = solver.interrupter();
            let task = solver.solve().unwrap();
            drop(solver);
            tokio::time::sleep(Duration::from_millis(50)).await;
            interrupter.interrupt();
            assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
        }

        #[tokio::test]
        async fn search_after_interrupt() {
            use std::time::Duration;
            use satbridge::solvers::{Solver, SolverResult};

            let solver = Solver::<#engine>::default();
            pigeonhole(&solver, 11);
            let task = solver.solve().unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            solver.interrupt();
            assert_eq!(task.await.unwrap(), SolverResult::Interrupted);
            // two pigeons assumed in the first hole conflict right away
            let res = solver.solve_assumps(&[1, 12]).unwrap().await.unwrap();
            assert_eq!(res, SolverResult::Unsat);
        }
    }
}
