//! Lowering of Algo statements into flowchart graphs

use std::collections::{BTreeMap, HashMap};

use usdb_ast::*;

use crate::model::{FlowchartSet, NodeId, NodeKind};

/// Flowcharts of one program
#[derive(Debug, Clone, PartialEq)]
pub struct Flowcharts {
    pub main: FlowchartSet,
    /// Keyed by the routine name as declared
    pub subroutines: BTreeMap<String, FlowchartSet>,
}

/// Build the main flowchart and one flowchart per routine
pub fn lower_program(program: &Program) -> Flowcharts {
    // lowercase name -> declared name
    let routines: HashMap<String, String> = program
        .routines()
        .map(|r| (r.name().to_ascii_lowercase(), r.name().to_string()))
        .collect();

    let main = Builder::new(&program.name, &routines).build("Start", &program.body);

    let mut subroutines = BTreeMap::new();
    for routine in program.routines() {
        let params: Vec<&str> = routine.parameters().iter().map(|p| p.name.as_str()).collect();
        let header = format!("{}({})", routine.name(), params.join(", "));
        let set = Builder::new(routine.name(), &routines).build(&header, routine.body());
        log::trace!("{}: {} nodes, {} edges", routine.name(), set.nodes.len(), set.edges.len());
        subroutines.insert(routine.name().to_string(), set);
    }

    Flowcharts { main, subroutines }
}

/// A dangling edge waiting for the next node
struct Exit {
    from: NodeId,
    label: Option<String>,
}

impl Exit {
    fn plain(from: NodeId) -> Self {
        Self { from, label: None }
    }

    fn labeled(from: NodeId, label: impl Into<String>) -> Self {
        Self { from, label: Some(label.into()) }
    }
}

struct Builder<'a> {
    set: FlowchartSet,
    routines: &'a HashMap<String, String>,
    returns: Vec<NodeId>,
}

impl<'a> Builder<'a> {
    fn new(name: &str, routines: &'a HashMap<String, String>) -> Self {
        Self {
            set: FlowchartSet::new(name),
            routines,
            returns: Vec::new(),
        }
    }

    fn build(mut self, start_label: &str, body: &[Statement]) -> FlowchartSet {
        let start = self.set.add_node(NodeKind::Start, start_label, None);
        let exits = self.lower_statements(body, vec![Exit::plain(start)]);

        let end = self.set.add_node(NodeKind::End, "End", None);
        self.connect(exits, end);
        for node in std::mem::take(&mut self.returns) {
            self.set.add_edge(node, end, None);
        }
        self.set
    }

    fn connect(&mut self, exits: Vec<Exit>, to: NodeId) {
        for exit in exits {
            self.set.add_edge(exit.from, to, exit.label);
        }
    }

    fn node(&mut self, kind: NodeKind, label: String, span: Span, exits: Vec<Exit>) -> NodeId {
        let id = self.set.add_node(kind, label, Some(span));
        self.connect(exits, id);
        id
    }

    fn lower_statements(&mut self, statements: &[Statement], mut exits: Vec<Exit>) -> Vec<Exit> {
        for stmt in statements {
            exits = self.lower_statement(stmt, exits);
        }
        exits
    }

    fn lower_statement(&mut self, stmt: &Statement, exits: Vec<Exit>) -> Vec<Exit> {
        match &stmt.kind {
            StatementKind::Assignment { .. }
            | StatementKind::Print { .. }
            | StatementKind::Scan { .. } => {
                let id = self.node(NodeKind::Process, stmt.to_algo(), stmt.span, exits);
                vec![Exit::plain(id)]
            }

            StatementKind::Call { name, .. } => {
                let id = self.node(NodeKind::Call, stmt.to_algo(), stmt.span, exits);
                self.set.nodes[id].target = self.routines.get(&name.to_ascii_lowercase()).cloned();
                vec![Exit::plain(id)]
            }

            StatementKind::Return { .. } => {
                let id = self.node(NodeKind::Return, stmt.to_algo(), stmt.span, exits);
                self.returns.push(id);
                Vec::new()
            }

            StatementKind::Block { statements } => self.lower_statements(statements, exits),

            StatementKind::If { condition, then_branch, else_branch } => {
                let decision = self.node(NodeKind::Decision, condition.to_algo(), stmt.span, exits);
                let mut branches = self.lower_statement(then_branch, vec![Exit::labeled(decision, "true")]);
                let otherwise = vec![Exit::labeled(decision, "false")];
                match else_branch {
                    Some(else_branch) => branches.extend(self.lower_statement(else_branch, otherwise)),
                    None => branches.extend(otherwise),
                }
                self.merge(branches, stmt.span)
            }

            StatementKind::While { condition, body } => {
                let head = self.node(NodeKind::Loop, condition.to_algo(), stmt.span, exits);
                let body_exits = self.lower_statement(body, vec![Exit::labeled(head, "true")]);
                self.connect(body_exits, head);
                vec![Exit::labeled(head, "false")]
            }

            StatementKind::For { variable, start, end, step, body } => {
                let init = self.node(
                    NodeKind::Process,
                    format!("{} <- {}", variable, start.to_algo()),
                    stmt.span,
                    exits,
                );
                let comparison = if step.as_ref().is_some_and(is_negative_literal) { ">=" } else { "<=" };
                let head = self.node(
                    NodeKind::Loop,
                    format!("{} {} {}", variable, comparison, end.to_algo()),
                    stmt.span,
                    vec![Exit::plain(init)],
                );
                let body_exits = self.lower_statement(body, vec![Exit::labeled(head, "true")]);
                // a body that always returns never reaches the increment
                if body_exits.is_empty() {
                    return vec![Exit::labeled(head, "false")];
                }
                let increment = self.node(
                    NodeKind::Process,
                    increment_label(variable, step.as_ref()),
                    stmt.span,
                    body_exits,
                );
                self.set.add_edge(increment, head, None);
                vec![Exit::labeled(head, "false")]
            }

            StatementKind::DoWhile { body, condition } => {
                // the first node the body creates; the decision itself when the body is empty
                let entry = self.set.nodes.len();
                let body_exits = self.lower_statement(body, exits);
                if body_exits.is_empty() {
                    return body_exits;
                }
                let decision = self.node(NodeKind::Decision, condition.to_algo(), stmt.span, body_exits);
                self.set.add_edge(decision, entry, Some("true".to_string()));
                vec![Exit::labeled(decision, "false")]
            }

            StatementKind::Switch { expression, cases, default_case } => {
                let decision = self.node(NodeKind::Decision, expression.to_algo(), stmt.span, exits);
                let mut arms = Vec::new();
                for case in cases {
                    let values: Vec<String> = case.values.iter().map(ToAlgo::to_algo).collect();
                    let arm = vec![Exit::labeled(decision, values.join(", "))];
                    arms.extend(self.lower_statements(&case.body, arm));
                }
                let fallback = vec![Exit::labeled(decision, "default")];
                match default_case {
                    Some(body) => arms.extend(self.lower_statements(body, fallback)),
                    None => arms.extend(fallback),
                }
                self.merge(arms, stmt.span)
            }
        }
    }

    fn merge(&mut self, exits: Vec<Exit>, span: Span) -> Vec<Exit> {
        // every branch returned, nothing flows on
        if exits.is_empty() {
            return exits;
        }
        let merge = self.node(NodeKind::Merge, String::new(), span, exits);
        vec![Exit::plain(merge)]
    }
}

fn is_negative_literal(step: &Expression) -> bool {
    match &step.unparenthesized().kind {
        ExpressionKind::Integer(v) => *v < 0,
        ExpressionKind::Real(v) => *v < 0.0,
        ExpressionKind::Unary { operator: UnaryOperator::Neg, operand } => matches!(
            operand.unparenthesized().kind,
            ExpressionKind::Integer(_) | ExpressionKind::Real(_)
        ),
        _ => false,
    }
}

fn increment_label(variable: &str, step: Option<&Expression>) -> String {
    let Some(step) = step else {
        return format!("{} <- {} + 1", variable, variable);
    };
    match &step.unparenthesized().kind {
        ExpressionKind::Unary { operator: UnaryOperator::Neg, operand } => {
            format!("{} <- {} - {}", variable, variable, operand.to_algo())
        }
        ExpressionKind::Integer(v) if *v < 0 => format!("{} <- {} - {}", variable, variable, -v),
        _ => format!("{} <- {} + {}", variable, variable, step.to_algo()),
    }
}
