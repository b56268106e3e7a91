/**
 * Host Expression Serializer
 *
 * Serializes host ASTs back to canonical source text.
 */
use super::ast::*;

/// Serialize an expression.
pub fn serialize(expr: &Expr) -> String {
    let mut visitor = SerializeExpressionVisitor;
    visit_expr(&mut visitor, expr)
}

/// Serialize a parameter list without surrounding parentheses.
pub fn serialize_params(params: &Params) -> String {
    SerializeExpressionVisitor.visit_params(params)
}

/// Serialize call arguments without surrounding parentheses.
pub fn serialize_call_args(args: &CallArgs) -> String {
    SerializeExpressionVisitor.visit_call_args(args)
}

/// Quote `value` as a double-quoted host string.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

struct SerializeExpressionVisitor;

fn visit_expr(visitor: &mut SerializeExpressionVisitor, expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Nil => "nil".to_string(),
        Expr::Bool(value) => value.to_string(),
        Expr::Int(value) => value.to_string(),
        Expr::Float(value) => visitor.visit_float(*value),
        Expr::Str(value) => quote(value),
        Expr::RawStr(value) => format!("`{}`", value),
        Expr::Array(elements) => visitor.visit_array(elements),
        Expr::Dict(entries) => visitor.visit_dict(entries),
        Expr::KeyValueArray(kv) => visitor.visit_key_value_array(kv),
        Expr::Paren(inner) => format!("({})", visit_expr(visitor, inner)),
        Expr::Unary(u) => format!("{}{}", u.operator, visit_expr(visitor, &u.expr)),
        Expr::Binary(b) => visitor.visit_binary(b),
        Expr::Conditional(c) => visitor.visit_conditional(c),
        Expr::Selector(s) => visitor.visit_selector(s),
        Expr::Index(i) => visitor.visit_index(i),
        Expr::Call(c) => visitor.visit_call(c),
    }
}

impl SerializeExpressionVisitor {
    fn visit_float(&mut self, value: f64) -> String {
        if value.is_finite() && value.fract() == 0.0 {
            format!("{:.1}", value)
        } else {
            value.to_string()
        }
    }

    fn visit_array(&mut self, elements: &[Expr]) -> String {
        let items: Vec<String> = elements.iter().map(|e| visit_expr(self, e)).collect();
        format!("[{}]", items.join(", "))
    }

    fn visit_dict(&mut self, entries: &[DictEntry]) -> String {
        let items: Vec<String> = entries
            .iter()
            .map(|e| format!("{}: {}", visit_expr(self, &e.key), visit_expr(self, &e.value)))
            .collect();
        format!("{{{}}}", items.join(", "))
    }

    fn visit_key_value(&mut self, kv: &KeyValue) -> String {
        match &kv.value {
            Some(value) => format!("{}={}", visit_expr(self, &kv.key), visit_expr(self, value)),
            None => visit_expr(self, &kv.key),
        }
    }

    fn visit_key_value_array(&mut self, kv: &KeyValueArray) -> String {
        let items: Vec<String> = kv.elements.iter().map(|e| self.visit_key_value(e)).collect();
        if kv.paren {
            format!("(;{})", items.join(", "))
        } else {
            format!("[{}]", items.join(", "))
        }
    }

    fn visit_binary(&mut self, ast: &Binary) -> String {
        format!(
            "{} {} {}",
            visit_expr(self, &ast.left),
            ast.operation,
            visit_expr(self, &ast.right)
        )
    }

    fn visit_conditional(&mut self, ast: &Conditional) -> String {
        let false_exp = match &ast.false_exp {
            Some(e) => visit_expr(self, e),
            None => "nil".to_string(),
        };
        format!(
            "{} ? {} : {}",
            visit_expr(self, &ast.condition),
            visit_expr(self, &ast.true_exp),
            false_exp
        )
    }

    fn visit_selector(&mut self, ast: &Selector) -> String {
        let op = if ast.safe { "?." } else { "." };
        format!("{}{}{}", visit_expr(self, &ast.receiver), op, ast.name)
    }

    fn visit_index(&mut self, ast: &Index) -> String {
        let op = if ast.safe { "?." } else { "" };
        format!(
            "{}{}[{}]",
            visit_expr(self, &ast.receiver),
            op,
            visit_expr(self, &ast.key)
        )
    }

    fn visit_call(&mut self, ast: &Call) -> String {
        format!(
            "{}({})",
            visit_expr(self, &ast.callee),
            self.visit_call_args(&ast.args)
        )
    }

    fn visit_call_args(&mut self, args: &CallArgs) -> String {
        let positional: Vec<String> = args
            .positional
            .iter()
            .map(|a| {
                let value = match &a.value {
                    // a bare kv array argument keeps the paren form
                    Expr::KeyValueArray(kv) if !kv.paren => self.visit_key_value_array(&KeyValueArray {
                        elements: kv.elements.clone(),
                        paren: true,
                    }),
                    other => visit_expr(self, other),
                };
                if a.spread {
                    format!("*{}", value)
                } else {
                    value
                }
            })
            .collect();

        let named: Vec<String> = args
            .named
            .iter()
            .map(|n| match (&n.name, &n.value) {
                (None, Some(value)) => format!("**{}", visit_expr(self, value)),
                (Some(name), Some(value)) => {
                    format!("{}={}", visit_expr(self, name), visit_expr(self, value))
                }
                (Some(name), None) => visit_expr(self, name),
                (None, None) => String::new(),
            })
            .collect();

        match (positional.is_empty(), named.is_empty()) {
            (_, true) => positional.join(", "),
            (true, false) => format!(";{}", named.join(", ")),
            (false, false) => format!("{}; {}", positional.join(", "), named.join(", ")),
        }
    }

    fn visit_params(&mut self, params: &Params) -> String {
        let mut positional: Vec<String> = params.positional.clone();
        if let Some(name) = &params.variadic {
            positional.push(format!("*{}", name));
        }

        let mut named: Vec<String> = params
            .named
            .iter()
            .map(|p| format!("{}={}", p.name, visit_expr(self, &p.default)))
            .collect();
        if let Some(name) = &params.named_variadic {
            named.push(format!("**{}", name));
        }

        match (positional.is_empty(), named.is_empty()) {
            (_, true) => positional.join(", "),
            (true, false) => format!(";{}", named.join(", ")),
            (false, false) => format!("{}; {}", positional.join(", "), named.join(", ")),
        }
    }
}
