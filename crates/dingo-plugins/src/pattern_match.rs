use dingo_exhaustive::{analyze, Arm, Coverage, Pattern, VariantSet, Warning};
use dingo_foundation::DiagnosticError;
use dingo_goast::{Comment, LitKind, NodeId, NodeKind, Span};
use dingo_plugin_api::{Plugin, PluginContext};
use dingo_preprocessor::EnumRegistry;

const MATCH_START_MARKER: &str = "DINGO_MATCH_START";
const PATTERN_PREFIX: &str = "DINGO_PATTERN:";

struct MatchSite {
    switch: NodeId,
    span: Span,
}

/// Runs real exhaustiveness analysis over every `switch` the rust-match
/// preprocessor pass emitted — found by its `DINGO_MATCH_START` marker
/// comment — using the `DINGO_PATTERN` markers it left on each case to
/// recover the variant name a generated `tag == Const` condition alone
/// can't name. Depends on `ResultType`/`OptionType` so a switch over a
/// monomorphized Result/Option already has its tag constants in scope.
#[derive(Default)]
pub struct PatternMatchPlugin {
    registry: EnumRegistry,
    sites: Vec<MatchSite>,
    needs_default: Vec<bool>,
}

impl PatternMatchPlugin {
    pub fn with_registry(registry: EnumRegistry) -> Self {
        Self { registry, ..Self::default() }
    }

    fn resolve_variant_set(&self, names: &[String]) -> VariantSet {
        const RESULT_NAMES: [&str; 2] = ["Ok", "Err"];
        const OPTION_NAMES: [&str; 2] = ["Some", "None"];

        if names.iter().any(|n| RESULT_NAMES.contains(&n.as_str())) {
            return VariantSet::Known(RESULT_NAMES.iter().map(|s| s.to_string()).collect());
        }
        if names.iter().any(|n| OPTION_NAMES.contains(&n.as_str())) {
            return VariantSet::Known(OPTION_NAMES.iter().map(|s| s.to_string()).collect());
        }
        for n in names {
            if let Some((def, _)) = self.registry.resolve_variant(n) {
                return VariantSet::Known(def.variant_names().into_iter().map(String::from).collect());
            }
        }
        VariantSet::Open
    }
}

impl Plugin for PatternMatchPlugin {
    fn name(&self) -> &'static str {
        "PatternMatch"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["ResultType", "OptionType"]
    }

    fn reset(&mut self) {
        self.sites.clear();
        self.needs_default.clear();
    }

    fn discover(&mut self, ctx: &PluginContext) -> Result<(), DiagnosticError> {
        let mut markers: Vec<&Comment> = ctx
            .comments
            .iter()
            .filter(|c| marker_name(c) == Some(MATCH_START_MARKER))
            .collect();
        markers.sort_by_key(|c| c.pos);

        let mut switches: Vec<NodeId> =
            ctx.ast.ids().filter(|&id| matches!(ctx.ast.get(id), NodeKind::SwitchStmt { .. })).collect();
        switches.sort_by_key(|&id| ctx.ast.span(id).start);

        // Markers and the switches they precede both appear in source
        // order with no interleaving from unrelated matches, so a single
        // forward scan pairs each marker with the next not-yet-claimed
        // switch after it.
        let mut next_switch = 0usize;
        for marker in markers {
            while next_switch < switches.len() && ctx.ast.span(switches[next_switch]).start <= marker.pos {
                next_switch += 1;
            }
            if next_switch >= switches.len() {
                break;
            }
            let switch = switches[next_switch];
            self.sites.push(MatchSite { switch, span: ctx.ast.span(switch) });
            next_switch += 1;
        }
        Ok(())
    }

    fn transform(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        self.needs_default = Vec::with_capacity(self.sites.len());

        for site in &self.sites {
            let cases = match ctx.ast.get(site.switch) {
                NodeKind::SwitchStmt { cases, .. } => cases.clone(),
                _ => {
                    self.needs_default.push(false);
                    continue;
                }
            };

            let mut arms = Vec::with_capacity(cases.len());
            let mut variant_names = Vec::new();
            let mut default_present = false;
            let mut closing_wildcard_present = false;

            for &case in &cases {
                let (list, case_span) = match ctx.ast.get(case) {
                    NodeKind::CaseClause { list, .. } => (list.clone(), ctx.ast.span(case)),
                    _ => continue,
                };
                if list.is_empty() {
                    default_present = true;
                    continue;
                }

                let Some(pattern_text) = attached_pattern(ctx.comments, case_span) else { continue };
                let guarded = is_guarded(ctx.ast, list[0]);

                if pattern_text == "_" || is_catchall_condition(ctx.ast, list[0]) {
                    if !guarded {
                        closing_wildcard_present = true;
                    }
                    arms.push(Arm { pattern: Pattern::Wildcard, guarded });
                } else {
                    let variant = variant_name(&pattern_text);
                    variant_names.push(variant.clone());
                    arms.push(if guarded { Arm::guarded_variant(variant) } else { Arm::variant(variant) });
                }
            }

            let variants = self.resolve_variant_set(&variant_names);
            let coverage = analyze(&variants, &arms);

            for warning in coverage.warnings() {
                ctx.report_warning(site.span.start, describe_warning(warning))?;
            }

            match &coverage {
                Coverage::Missing { missing, .. } => {
                    if ctx.config.strict_exhaustiveness {
                        ctx.report_error(
                            site.span.start,
                            format!("non-exhaustive match: missing {}", missing.join(", ")),
                        )?;
                    }
                }
                Coverage::WildcardRequired { .. } => {
                    if ctx.config.strict_exhaustiveness {
                        ctx.report_error(
                            site.span.start,
                            "non-exhaustive match over a type with no known variant set: add a wildcard arm",
                        )?;
                    }
                }
                Coverage::Exhaustive { .. } => {}
            }

            self.needs_default.push(coverage.is_exhaustive() && !default_present && !closing_wildcard_present);
        }
        Ok(())
    }

    fn inject(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        for (site, &needs_default) in self.sites.iter().zip(&self.needs_default) {
            if !needs_default {
                continue;
            }
            let span = site.span;
            let panic_fn = ctx.ast.push(NodeKind::Ident("panic".to_string()), span);
            let msg = ctx.ast.push(
                NodeKind::BasicLit { kind: LitKind::String, value: "\"unreachable: match is exhaustive\"".to_string() },
                span,
            );
            let call = ctx.ast.push(NodeKind::CallExpr { func: panic_fn, args: vec![msg], ellipsis: false }, span);
            let stmt = ctx.ast.push(NodeKind::ExprStmt(call), span);
            let default_case = ctx.ast.push(NodeKind::CaseClause { list: vec![], body: vec![stmt] }, span);
            if let NodeKind::SwitchStmt { cases, .. } = ctx.ast.get_mut(site.switch) {
                cases.push(default_case);
            }
        }
        Ok(())
    }
}

fn marker_name<'a>(c: &'a Comment) -> Option<&'a str> {
    let trimmed = c.text.trim_start_matches("//").trim();
    trimmed.split(':').next().filter(|s| !s.is_empty())
}

fn attached_pattern(comments: &[Comment], case_span: Span) -> Option<String> {
    comments.iter().filter(|c| case_span.encloses(Span::point(c.pos))).find_map(|c| {
        let trimmed = c.text.trim_start_matches("//").trim();
        trimmed.strip_prefix(PATTERN_PREFIX).map(|s| s.trim().to_string())
    })
}

fn variant_name(pattern_text: &str) -> String {
    let cut = pattern_text.find(['(', '{']).unwrap_or(pattern_text.len());
    pattern_text[..cut].trim().to_string()
}

fn is_guarded(ast: &dingo_goast::Ast, cond: NodeId) -> bool {
    matches!(ast.get(cond), NodeKind::BinaryExpr { op, .. } if op == "&&")
}

/// A catch-all arm (`_` or a bare binding identifier) lowers to a bare
/// `true` condition, possibly ANDed with a guard — unlike a real variant
/// arm, which always lowers to a `tag == Const` comparison.
fn is_catchall_condition(ast: &dingo_goast::Ast, cond: NodeId) -> bool {
    match ast.get(cond) {
        NodeKind::Ident(name) => name == "true",
        NodeKind::BinaryExpr { op, x, .. } if op == "&&" => is_catchall_condition(ast, *x),
        _ => false,
    }
}

fn describe_warning(w: &Warning) -> String {
    match w {
        Warning::UnreachableAfterWildcard { index } => {
            format!("arm {index} is unreachable: an earlier wildcard arm already matches everything")
        }
        Warning::DuplicateArm { variant, index } => {
            format!("arm {index} repeats variant {variant}, already covered by an earlier arm")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_foundation::DiagnosticSink;
    use dingo_goast::ParsedFile;
    use dingo_plugin_api::PluginConfig;
    use dingo_typecheck::Info;

    fn run(source: &str) -> (dingo_goast::Ast, DiagnosticSink) {
        let parsed = ParsedFile::parse("f.dingo", source).unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();
        let mut plugin = PatternMatchPlugin::default();

        {
            let ctx =
                PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.discover(&ctx).unwrap();
        }
        {
            let mut ctx =
                PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.transform(&mut ctx).unwrap();
        }
        {
            let mut ctx =
                PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.inject(&mut ctx).unwrap();
        }
        (ast, sink)
    }

    #[test]
    fn exhaustive_result_match_is_accepted_without_error() {
        let src = "package p\n\nfunc F() {\n\t// DINGO_MATCH_START: r\n\t__match1 := r\n\tswitch {\n\tcase __match1.tag == ResultTagOk:\n\t\t// DINGO_PATTERN: Ok(v)\n\t\tuse(v)\n\tcase __match1.tag == ResultTagErr:\n\t\t// DINGO_PATTERN: Err(e)\n\t\tlog(e)\n\t}\n}\n";
        let (_, sink) = run(src);
        assert!(!sink.has_errors());
    }

    #[test]
    fn non_exhaustive_result_match_is_rejected() {
        let src = "package p\n\nfunc F() {\n\t// DINGO_MATCH_START: r\n\t__match1 := r\n\tswitch {\n\tcase __match1.tag == ResultTagOk:\n\t\t// DINGO_PATTERN: Ok(v)\n\t\tuse(v)\n\t}\n}\n";
        let (_, sink) = run(src);
        assert!(sink.has_errors());
    }

    #[test]
    fn wildcard_arm_closes_an_otherwise_incomplete_match_without_injecting_another_default() {
        let src = "package p\n\nfunc F() {\n\t// DINGO_MATCH_START: r\n\t__match1 := r\n\tswitch {\n\tcase __match1.tag == ResultTagOk:\n\t\t// DINGO_PATTERN: Ok(v)\n\t\tuse(v)\n\tcase true:\n\t\t// DINGO_PATTERN: _\n\t\tother()\n\t}\n}\n";
        let (ast, sink) = run(src);
        assert!(!sink.has_errors());
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("root is not a file") };
        let NodeKind::FuncDecl { body: Some(body), .. } = ast.get(decls[0]) else { panic!("expected a func decl") };
        let NodeKind::Block { stmts } = ast.get(*body) else { panic!("expected a block") };
        let switch_id = stmts.iter().copied().find(|&s| matches!(ast.get(s), NodeKind::SwitchStmt { .. })).unwrap();
        let NodeKind::SwitchStmt { cases, .. } = ast.get(switch_id) else { unreachable!() };
        assert_eq!(cases.len(), 2, "no synthetic default case should have been injected");
    }
}
