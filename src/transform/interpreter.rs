//! Per-instruction interpretation of action lists.
//!
//! The interpreter resolves one instruction row into ordered primitive
//! calls over a shared [`FieldContext`]: each action sees the output of
//! the previous one. Rows are independent: there is no cross-row state,
//! and every row is processed exactly once.

use crate::dictionary::DictionaryEntry;
use crate::error::HarmonizeError;
use crate::instruction::{ActionKind, ActionSpec, InstructionRow};
use crate::models::{Column, FieldOptions, Table};
use crate::report::{FieldReport, PayloadKind, ReportEvent};
use crate::transform::actions::{self, FieldContext};
use crate::transform::pipeline::HarmonizeOptions;

/// Everything one instruction row produced.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    /// Unified field name.
    pub unified_name: String,
    /// Output column, when the action list produced one. `special`,
    /// no-op and unknown-only rows produce none.
    pub column: Option<Column>,
    /// Dictionary entry for the field, always produced whatever path
    /// the actions took.
    pub entry: DictionaryEntry,
    /// Per-field diagnostics.
    pub report: FieldReport,
}

/// Executes instruction rows against a source table.
pub struct Interpreter<'a> {
    source: &'a Table,
    options: &'a HarmonizeOptions,
}

impl<'a> Interpreter<'a> {
    pub fn new(source: &'a Table, options: &'a HarmonizeOptions) -> Self {
        Self { source, options }
    }

    /// Process one instruction row.
    ///
    /// Malformed payloads recover to their defaults with a report notice.
    /// Unknown actions are skipped, siblings still run. Composition
    /// errors and unresolvable source columns abort the row.
    pub fn interpret(&self, row: &InstructionRow) -> Result<FieldOutcome, HarmonizeError> {
        let mut report = FieldReport::new(&row.unified_name);

        let (spec, payload_err) = ActionSpec::parse(row.raw_actions.as_deref());
        if let Some(err) = payload_err {
            report.push(ReportEvent::PayloadDefaulted {
                payload: PayloadKind::Actions,
                message: err.to_string(),
            });
        }
        let (field_options, payload_err) = FieldOptions::parse(row.raw_options.as_deref());
        if let Some(err) = payload_err {
            report.push(ReportEvent::PayloadDefaulted {
                payload: PayloadKind::Options,
                message: err.to_string(),
            });
        }

        let mut ctx = FieldContext {
            column: None,
            options: field_options,
            description: row.description_b.clone(),
            report,
        };

        for action in &spec.actions {
            ctx = self.dispatch(action, ctx, row, &spec)?;
        }

        let entry = DictionaryEntry {
            unified_name: row.unified_name.clone(),
            description: ctx.description,
            options: FieldOptions::render(ctx.options.as_ref()),
            category: row.category.clone(),
        };

        Ok(FieldOutcome {
            unified_name: row.unified_name.clone(),
            column: ctx.column,
            entry,
            report: ctx.report,
        })
    }

    fn dispatch(
        &self,
        action: &ActionKind,
        mut ctx: FieldContext,
        row: &InstructionRow,
        spec: &ActionSpec,
    ) -> Result<FieldContext, HarmonizeError> {
        let audit = !self.options.skip_audit;
        match action {
            ActionKind::Copy => {
                let source = self.source_column(row, action)?;
                Ok(actions::copy(
                    ctx,
                    source,
                    &self.options.missing_markers,
                ))
            }
            ActionKind::Recode => {
                let source = self.source_column(row, action)?;
                Ok(actions::recode(ctx, source, &spec.recode, audit))
            }
            ActionKind::RecodeExtend => {
                let source = self.source_column(row, action)?;
                Ok(actions::recode_extend(
                    ctx,
                    source,
                    &spec.recode,
                    &row.description_a,
                    audit,
                ))
            }
            ActionKind::AddToDict => actions::add_to_dict(ctx, &spec.add_to_dict)
                .map_err(|err| HarmonizeError::action(&row.unified_name, err)),
            ActionKind::NewOptions => Ok(actions::new_options(ctx, &spec.new_options)),
            ActionKind::Special => {
                ctx.report.push(ReportEvent::SpecialPending);
                Ok(ctx)
            }
            ActionKind::Noop => {
                ctx.report.push(ReportEvent::NoActionTaken);
                Ok(ctx)
            }
            ActionKind::Unknown(name) => {
                ctx.report.push(ReportEvent::UnknownAction {
                    name: name.clone(),
                });
                Ok(ctx)
            }
        }
    }

    fn source_column(
        &self,
        row: &InstructionRow,
        action: &ActionKind,
    ) -> Result<&'a Column, HarmonizeError> {
        let name = row
            .source_b
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| HarmonizeError::NoSourceColumn {
                field: row.unified_name.clone(),
                action: action.name().to_string(),
            })?;
        self.source
            .column(name)
            .ok_or_else(|| HarmonizeError::MissingColumn {
                field: row.unified_name.clone(),
                column: name.to_string(),
            })
    }
}
