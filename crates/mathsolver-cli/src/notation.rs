//! LaTeX subset → Unicode text for terminal display.
//!
//! Covers what the solving service emits: fractions, roots, powers,
//! subscripts, `\left`/`\right` delimiters, Greek letters and the usual
//! function names. Anything else is a [`RenderError`] and the caller shows
//! the raw notation instead.

use mathsolver_core::RenderError;
use mathsolver_session::MathRenderer;

#[derive(Debug, Default, Clone, Copy)]
pub struct TextMathRenderer;

impl MathRenderer for TextMathRenderer {
    fn render(&self, notation: &str) -> Result<String, RenderError> {
        if notation.trim().is_empty() {
            return Err(RenderError::Empty);
        }
        check_braces(notation)?;
        let mut parser = Parser::new(notation);
        let text = parser.sequence(false)?;
        Ok(tidy(&text))
    }
}

fn check_braces(src: &str) -> Result<(), RenderError> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in src.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(RenderError::UnbalancedBraces(i))?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(RenderError::UnbalancedBraces(src.len()))
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    len: usize,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.char_indices().collect(),
            len: src.len(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |(i, _)| *i)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Render until end of input, or until the closing brace of the current group.
    fn sequence(&mut self, in_group: bool) -> Result<String, RenderError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '}' {
                if in_group {
                    self.pos += 1;
                    return Ok(out);
                }
                return Err(RenderError::UnbalancedBraces(self.offset()));
            }
            out.push_str(&self.atom()?);
        }
        if in_group {
            Err(RenderError::UnbalancedBraces(self.len))
        } else {
            Ok(out)
        }
    }

    fn atom(&mut self) -> Result<String, RenderError> {
        let at = self.offset();
        let Some(c) = self.bump() else {
            return Err(RenderError::MissingArgument(at));
        };
        match c {
            '{' => self.sequence(true),
            '\\' => self.command(),
            '^' => Ok(superscript(&self.argument()?)),
            '_' => Ok(subscript(&self.argument()?)),
            '~' | '&' => Ok(" ".into()),
            other => Ok(other.to_string()),
        }
    }

    fn argument(&mut self) -> Result<String, RenderError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(RenderError::MissingArgument(self.len));
        }
        self.atom()
    }

    /// `[...]` right after a command, e.g. the index of `\sqrt[3]{x}`.
    fn optional_argument(&mut self) -> Result<Option<String>, RenderError> {
        if self.peek() != Some('[') {
            return Ok(None);
        }
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Some(out));
                }
                Some(_) => out.push_str(&self.atom()?),
                None => return Err(RenderError::MissingArgument(self.len)),
            }
        }
    }

    fn command(&mut self) -> Result<String, RenderError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = if self.pos == start {
            match self.bump() {
                Some(c) => c.to_string(),
                None => return Err(RenderError::MissingArgument(self.len)),
            }
        } else {
            self.chars[start..self.pos].iter().map(|(_, c)| c).collect()
        };

        let text = match name.as_str() {
            "," | ":" | ";" | " " | "quad" | "qquad" | "\\" => " ".to_string(),
            "!" | "limits" | "nolimits" | "displaystyle" | "textstyle" => String::new(),
            "{" | "}" | "%" | "$" | "#" | "_" | "|" => name.clone(),
            "left" | "right" | "big" | "Big" | "bigg" | "Bigg" => {
                self.skip_ws();
                if self.peek() == Some('.') {
                    self.pos += 1;
                }
                String::new()
            }
            "frac" | "dfrac" | "tfrac" => {
                let num = self.argument()?;
                let den = self.argument()?;
                format!("{}/{}", wrap(&num), wrap(&den))
            }
            "sqrt" => {
                let index = self.optional_argument()?;
                let radicand = wrap(&self.argument()?);
                match index {
                    Some(n) => format!("{}√{radicand}", superscript_or_plain(&n)),
                    None => format!("√{radicand}"),
                }
            }
            "text" | "textrm" | "mathrm" | "mathit" | "mathbf" | "mathsf" | "operatorname"
            | "tilde" | "hat" | "bar" | "overline" | "vec" => self.argument()?,
            "mathbb" => {
                let arg = self.argument()?;
                blackboard(&arg).unwrap_or(arg)
            }
            other => match symbol(other) {
                Some(s) => s.to_string(),
                None if FUNCTIONS.contains(&other) => other.to_string(),
                None => return Err(RenderError::UnknownCommand(other.to_string())),
            },
        };
        Ok(text)
    }
}

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "sinh", "cosh", "tanh", "coth", "sech", "csch",
    "arcsin", "arccos", "arctan", "asin", "acos", "atan", "asinh", "acosh", "atanh", "log", "ln",
    "exp", "lim", "det", "max", "min", "arg", "gcd", "deg", "sup", "inf",
];

fn symbol(name: &str) -> Option<&'static str> {
    let s = match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" | "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" | "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        "infty" => "∞",
        "cdot" => "·",
        "times" => "×",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "equiv" => "≡",
        "to" | "rightarrow" => "→",
        "int" => "∫",
        "iint" => "∬",
        "oint" => "∮",
        "sum" => "∑",
        "prod" => "∏",
        "partial" => "∂",
        "nabla" => "∇",
        "cdots" => "⋯",
        "ldots" | "dots" => "…",
        "emptyset" => "∅",
        "in" => "∈",
        "circ" => "∘",
        "ell" => "ℓ",
        "hbar" => "ħ",
        "vee" => "∨",
        "wedge" => "∧",
        _ => return None,
    };
    Some(s)
}

fn blackboard(arg: &str) -> Option<String> {
    let s = match arg {
        "R" => "ℝ",
        "C" => "ℂ",
        "N" => "ℕ",
        "Z" => "ℤ",
        "Q" => "ℚ",
        _ => return None,
    };
    Some(s.to_string())
}

/// Parenthesize anything that is not a single token.
fn wrap(s: &str) -> String {
    let s = s.trim();
    let atomic = !s.is_empty()
        && (s.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '∞')
            || (s.starts_with('(') && s.ends_with(')') && s.matches('(').count() == 1));
    if atomic {
        s.to_string()
    } else {
        format!("({s})")
    }
}

fn superscript_char(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'n' => 'ⁿ',
        'i' => 'ⁱ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'k' => 'ᵏ',
        'm' => 'ᵐ',
        't' => 'ᵗ',
        _ => return None,
    })
}

fn subscript_char(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'o' => 'ₒ',
        'x' => 'ₓ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'n' => 'ₙ',
        't' => 'ₜ',
        _ => return None,
    })
}

/// Short exponents use Unicode superscripts; longer ones stay as `^(...)`.
const MAX_SCRIPT_LEN: usize = 3;

fn map_script(s: &str, f: fn(char) -> Option<char>) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.chars().count() > MAX_SCRIPT_LEN {
        return None;
    }
    s.chars().map(f).collect()
}

fn superscript(s: &str) -> String {
    map_script(s, superscript_char).unwrap_or_else(|| format!("^{}", wrap(s)))
}

fn superscript_or_plain(s: &str) -> String {
    map_script(s, superscript_char).unwrap_or_else(|| s.trim().to_string())
}

fn subscript(s: &str) -> String {
    map_script(s, subscript_char).unwrap_or_else(|| format!("_{}", wrap(s)))
}

fn tidy(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("( ", "(").replace(" )", ")")
}
