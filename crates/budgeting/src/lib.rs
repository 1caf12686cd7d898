//! Budgeting domain module: spending categories with an allocated amount,
//! and the dated expenses recorded against them.

pub mod budget;
pub mod expense;
pub mod summary;

pub use budget::{Budget, BudgetId, BudgetPatch, NewBudget};
pub use expense::{Expense, ExpenseId, ExpensePatch, NewExpense};
pub use summary::{BudgetSummary, summarize};
