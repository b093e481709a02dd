//! Type eraser and CommonJS lowerer.
//!
//! Walks the token stream produced by [`super::lexer`], copying surviving
//! source text verbatim (by span, not re-printing) while erasing
//! TypeScript type syntax and lowering ES module statements to `require`
//! and `exports.*`. Context is tracked with a bracket-frame stack rather
//! than a full parse tree; constructs that cannot be erased safely at
//! token level (namespaces, decorators, re-exports, computed enum
//! initializers, parameter properties in derived classes) abort with a
//! positioned diagnostic instead of producing broken output.

use super::lexer::{Token, TokenKind};
use super::Diagnostic;

/// Erase types and lower modules. `toks` must come from the same `src`.
pub(crate) fn strip(src: &str, toks: &[Token]) -> Result<String, Diagnostic> {
    Emitter::new(src, toks).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PKind {
    /// Declared parameter list (function/method/ctor): colons here are
    /// annotations.
    ParamsDecl { ctor: bool },
    /// Call argument list: colons inside are never annotations.
    Call,
    /// Grouping parens; `control` marks `if (...)` style heads.
    Group { control: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FKind {
    Top,
    Block,
    Object,
    Bracket,
    ClassBody { member_start: bool, has_extends: bool },
    Paren(PKind),
}

#[derive(Debug)]
struct Frame {
    kind: FKind,
    ternary: u32,
}

/// Previous significant token, summarized for context decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prev {
    None,
    Ident(String),
    Value,
    CloseParen(PKind),
    BlockClose,
    Punct(String),
}

#[derive(Debug)]
struct VarDecl {
    depth: usize,
    awaiting_name: bool,
    awaiting_ann: bool,
    export: bool,
}

struct Emitter<'a> {
    src: &'a str,
    toks: &'a [Token],
    i: usize,
    emitted: usize,
    out: String,
    frames: Vec<Frame>,
    stmt_start: bool,
    prev: Prev,
    after_function: bool,
    after_method_name: bool,
    method_is_ctor: bool,
    after_control: bool,
    class_pending: bool,
    class_pending_extends: bool,
    ctor_modifier_seen: bool,
    ctor_props: Vec<String>,
    pending_ctor_props: Vec<String>,
    vd: Option<VarDecl>,
    in_case: bool,
    object_member_name: bool,
    exports: Vec<(String, String)>,
    export_capture: bool,
    uses_modules: bool,
}

/// Identifiers that never end an expression, so a following `{` is a
/// block and they are not `!`-assertable.
fn is_reserved_nonvalue(s: &str) -> bool {
    matches!(
        s,
        "const" | "let" | "var" | "function" | "class" | "return" | "if" | "else" | "for"
            | "while" | "do" | "switch" | "case" | "default" | "break" | "continue" | "new"
            | "delete" | "typeof" | "instanceof" | "void" | "in" | "of" | "try" | "catch"
            | "finally" | "throw" | "yield" | "await" | "async" | "extends" | "implements"
            | "import" | "export" | "as" | "satisfies"
    )
}

fn is_ts_modifier(s: &str) -> bool {
    matches!(
        s,
        "public" | "private" | "protected" | "readonly" | "abstract" | "override"
    )
}

impl<'a> Emitter<'a> {
    fn new(src: &'a str, toks: &'a [Token]) -> Self {
        Self {
            src,
            toks,
            i: 0,
            emitted: 0,
            out: String::with_capacity(src.len()),
            frames: vec![Frame {
                kind: FKind::Top,
                ternary: 0,
            }],
            stmt_start: true,
            prev: Prev::None,
            after_function: false,
            after_method_name: false,
            method_is_ctor: false,
            after_control: false,
            class_pending: false,
            class_pending_extends: false,
            ctor_modifier_seen: false,
            ctor_props: Vec::new(),
            pending_ctor_props: Vec::new(),
            vd: None,
            in_case: false,
            object_member_name: false,
            exports: Vec::new(),
            export_capture: false,
            uses_modules: false,
        }
    }

    // ---- token access -------------------------------------------------

    fn text(&self, i: usize) -> &'a str {
        self.toks[i].text(self.src)
    }

    /// First non-comment token index at or after `from`.
    fn sig(&self, from: usize) -> Option<usize> {
        self.toks
            .get(from..)
            .and_then(|rest| rest.iter().position(|t| !t.is_comment()))
            .map(|p| from + p)
    }

    fn sig_text(&self, from: usize) -> Option<&'a str> {
        self.sig(from).map(|j| self.text(j))
    }

    /// Whether the source gap before token `i` contains a newline.
    fn preceded_by_newline(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        self.src[self.toks[i - 1].end..self.toks[i].start].contains('\n')
    }

    /// Statement position: explicit boundary or ASI-style line break.
    fn stmt_pos(&self, i: usize) -> bool {
        self.stmt_start || self.preceded_by_newline(i)
    }

    fn prev_is_value(&self) -> bool {
        match &self.prev {
            Prev::Value | Prev::CloseParen(PKind::Call | PKind::Group { .. }) => true,
            Prev::Ident(s) => !is_reserved_nonvalue(s),
            _ => false,
        }
    }

    fn prev_punct(&self, p: &str) -> bool {
        matches!(&self.prev, Prev::Punct(q) if q == p)
    }

    fn cur_frame_kind(&self) -> FKind {
        self.frames.last().expect("frame stack never empty").kind
    }

    fn diag(&self, i: usize, message: &str) -> Diagnostic {
        let offset = self.toks.get(i).map_or(self.src.len(), |t| t.start);
        Diagnostic {
            offset,
            message: message.to_string(),
        }
    }

    // ---- emission -----------------------------------------------------

    /// Copy the pending gap plus token `i`, advancing past it.
    fn emit_token(&mut self) {
        let t = &self.toks[self.i];
        self.out.push_str(&self.src[self.emitted..t.end]);
        self.emitted = t.end;
        self.i += 1;
    }

    /// Drop everything from the end of the last emitted text through the
    /// end of token `last` (the gap before the skipped range goes too).
    fn skip_through(&mut self, last: usize) {
        self.emitted = self.toks[last].end;
        self.i = last + 1;
    }

    /// Erase a type expression that starts at `from`; `kw_last` is the
    /// last token of the introducer (`:`, `as`, ...) erased with it.
    fn erase_type(&mut self, kw_last: usize, from: usize, arrow_stop: bool) {
        let end = self.skip_type(from, arrow_stop);
        let last = end.saturating_sub(1).max(kw_last);
        self.skip_through(last);
    }

    /// Copy the gap before token `self.i`, emit `text` in place of the
    /// range `self.i..=last`, and advance past it.
    fn replace_through(&mut self, last: usize, text: &str) {
        let start = self.toks[self.i].start;
        self.out.push_str(&self.src[self.emitted..start]);
        self.out.push_str(text);
        self.emitted = self.toks[last].end;
        self.i = last + 1;
    }

    fn frame(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack never empty")
    }

    fn push_frame(&mut self, kind: FKind) {
        self.frames.push(Frame { kind, ternary: 0 });
    }

    fn after_statement(&mut self) {
        self.stmt_start = true;
        self.prev = Prev::None;
        self.in_case = false;
    }

    /// A destructuring pattern at declarator position just closed.
    fn vd_pattern_closed(&mut self) {
        let depth = self.frames.len();
        if let Some(vd) = &mut self.vd {
            if vd.depth == depth && vd.awaiting_name {
                vd.awaiting_name = false;
                vd.awaiting_ann = true;
            }
        }
    }

    // ---- main loop ----------------------------------------------------

    fn run(mut self) -> Result<String, Diagnostic> {
        while self.i < self.toks.len() {
            let kind = self.toks[self.i].kind;
            match kind {
                TokenKind::LineComment | TokenKind::BlockComment => {
                    // Comments pass through without touching context.
                    self.emit_token();
                }
                TokenKind::Str | TokenKind::Number | TokenKind::Template | TokenKind::Regex => {
                    self.emit_token();
                    self.prev = Prev::Value;
                    self.stmt_start = false;
                    self.object_member_name = false;
                }
                TokenKind::Ident => self.on_ident()?,
                TokenKind::Punct => self.on_punct()?,
            }
        }
        // Trailing whitespace after the last token.
        self.out.push_str(&self.src[self.emitted..]);
        Ok(self.finish())
    }

    fn finish(mut self) -> String {
        if !self.exports.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        for (exported, local) in &self.exports {
            self.out
                .push_str(&format!("exports.{exported} = {local};\n"));
        }
        if self.uses_modules || !self.exports.is_empty() {
            let mut with_prologue = String::from(
                "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true });\n",
            );
            with_prologue.push_str(&self.out);
            return with_prologue;
        }
        self.out
    }

    // ---- identifiers --------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn on_ident(&mut self) -> Result<(), Diagnostic> {
        let i = self.i;
        let s = self.text(i);

        // Class body member-head zone: modifiers, names, accessors.
        if let FKind::ClassBody { member_start, .. } = self.cur_frame_kind() {
            if member_start || self.preceded_by_newline(i) {
                return self.on_class_member_head(s);
            }
        }

        // Statement-level TypeScript constructs.
        if self.stmt_pos(i) {
            match s {
                "interface" if self.next_is_ident(i) => return self.skip_interface(i),
                "type" if self.is_type_alias(i) => return self.skip_type_alias(i),
                "enum" => return self.lower_enum(i, self.export_capture),
                "const" if self.sig_text(i + 1) == Some("enum") => {
                    return self.lower_enum(i, self.export_capture);
                }
                "import" if self.is_import_statement(i) => return self.lower_import(i),
                "export" => return self.on_export(i),
                "declare" if self.next_is_ident(i) => return self.skip_declare(i),
                "abstract" if self.sig_text(i + 1) == Some("class") => {
                    self.skip_through(i);
                    return Ok(());
                }
                "namespace" | "module" if self.looks_like_namespace(i) => {
                    return Err(self.diag(i, "namespaces are not supported"));
                }
                _ => {}
            }
        }

        // `x as T` / `x satisfies T` casts.
        if (s == "as" || s == "satisfies") && self.prev_is_value() {
            self.erase_type(i, i + 1, false);
            return Ok(());
        }

        // `implements A, B<T>` clause on a class declaration.
        if s == "implements" && self.class_pending {
            let last = self.scan_until_brace(i);
            self.skip_through(last);
            return Ok(());
        }

        // Constructor parameter properties: the modifier vanishes, the
        // parameter name becomes a `this` assignment in the body.
        let in_ctor_params = matches!(
            self.cur_frame_kind(),
            FKind::Paren(PKind::ParamsDecl { ctor: true })
        );
        if in_ctor_params && self.at_param_name_position() {
            if is_ts_modifier(s) {
                self.ctor_modifier_seen = true;
                self.skip_through(i);
                return Ok(());
            }
            if self.ctor_modifier_seen {
                self.ctor_props.push(s.to_string());
                self.ctor_modifier_seen = false;
            }
        }

        // Keyword bookkeeping.
        match s {
            "function" => {
                self.after_function = true;
                self.capture_declaration_name(i);
            }
            "class" => {
                self.class_pending = true;
                self.class_pending_extends = false;
                self.capture_declaration_name(i);
            }
            "extends" if self.class_pending => self.class_pending_extends = true,
            "if" | "for" | "while" | "switch" | "catch" => self.after_control = true,
            "else" | "do" | "try" | "finally" => {
                self.emit_token();
                self.after_statement();
                return Ok(());
            }
            "case" => {
                if matches!(self.cur_frame_kind(), FKind::Block | FKind::Top) {
                    self.in_case = true;
                }
            }
            "default" => {
                if self.sig_text(i + 1) == Some(":")
                    && matches!(self.cur_frame_kind(), FKind::Block | FKind::Top)
                {
                    self.in_case = true;
                }
            }
            "const" | "let" | "var" if !self.prev_punct(".") => {
                self.vd = Some(VarDecl {
                    depth: self.frames.len(),
                    awaiting_name: true,
                    awaiting_ann: false,
                    export: self.export_capture,
                });
                self.export_capture = false;
            }
            "of" | "in" => {
                // `for (const x of xs)`: the declaration ends here.
                self.vd = None;
            }
            _ => {}
        }

        // Declarator names, exported bindings, ASI recovery.
        self.track_declarator(i, s);

        // Object literal entry names (for object method parameter lists).
        self.object_member_name = matches!(self.cur_frame_kind(), FKind::Object)
            && (self.prev_punct("{") || self.prev_punct(","));

        self.emit_token();
        self.prev = Prev::Ident(s.to_string());
        self.stmt_start = false;
        Ok(())
    }

    /// Record the declaration name following `export function` /
    /// `export class` when an export capture is pending.
    fn capture_declaration_name(&mut self, i: usize) {
        if !self.export_capture {
            return;
        }
        self.export_capture = false;
        let Some(mut k) = self.sig(i + 1) else { return };
        if self.text(k) == "*" {
            match self.sig(k + 1) {
                Some(n) => k = n,
                None => return,
            }
        }
        if self.toks[k].kind == TokenKind::Ident {
            let name = self.text(k).to_string();
            self.exports.push((name.clone(), name));
        }
    }

    /// Variable-declaration bookkeeping for an identifier token.
    fn track_declarator(&mut self, i: usize, s: &str) {
        enum Action {
            None,
            Clear,
            Record(String),
        }
        let mut action = Action::None;
        let depth = self.frames.len();
        let prev_is_ident = matches!(self.prev, Prev::Ident(_));
        let next_is_colon = self.sig_text(i + 1) == Some(":");
        let renamed = self.prev_punct(":");
        let pattern_entry = self.prev_punct("{")
            || self.prev_punct("[")
            || self.prev_punct(",")
            || self.prev_punct("...");
        if let Some(vd) = &mut self.vd {
            if vd.depth == depth && !matches!(s, "const" | "let" | "var") {
                if vd.awaiting_name {
                    vd.awaiting_name = false;
                    vd.awaiting_ann = true;
                    if vd.export {
                        action = Action::Record(s.to_string());
                    }
                } else if prev_is_ident {
                    // Two bare identifiers in a row: ASI boundary.
                    action = Action::Clear;
                }
            } else if vd.export && vd.awaiting_name && depth > vd.depth {
                // Binding inside an exported destructuring pattern:
                // `export const { a, b: c } = ...` exports a and c.
                if renamed || (pattern_entry && !next_is_colon) {
                    action = Action::Record(s.to_string());
                }
            }
        }
        match action {
            Action::None => {}
            Action::Clear => self.vd = None,
            Action::Record(name) => self.exports.push((name.clone(), name)),
        }
    }

    /// Member-head handling inside a class body.
    fn on_class_member_head(&mut self, s: &str) -> Result<(), Diagnostic> {
        let i = self.i;
        let next_head = self.sig(i + 1).is_some_and(|j| {
            matches!(self.toks[j].kind, TokenKind::Ident)
                || matches!(self.text(j), "[" | "#" | "*")
        });
        if (is_ts_modifier(s) || s == "declare") && next_head {
            // TS-only member modifiers vanish; `static` stays.
            self.skip_through(i);
            return Ok(());
        }
        if matches!(s, "static" | "async" | "get" | "set") && self.sig_text(i + 1) != Some("(") {
            self.emit_token();
            self.prev = Prev::Ident(s.to_string());
            self.stmt_start = false;
            self.set_member_start(true);
            return Ok(());
        }
        // The member name itself.
        let is_ctor = s == "constructor";
        let next = self.sig_text(i + 1);
        self.emit_token();
        self.prev = Prev::Ident(s.to_string());
        self.stmt_start = false;
        self.set_member_start(false);
        if matches!(next, Some("(" | "<")) {
            self.after_method_name = true;
            self.method_is_ctor = is_ctor;
        }
        Ok(())
    }

    fn set_member_start(&mut self, value: bool) {
        if let Some(Frame {
            kind: FKind::ClassBody { member_start, .. },
            ..
        }) = self.frames.last_mut()
        {
            *member_start = value;
        }
    }

    // ---- punctuation --------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn on_punct(&mut self) -> Result<(), Diagnostic> {
        let i = self.i;
        let p = self.text(i);
        match p {
            "(" => {
                let kind = if self.after_function || self.after_method_name || self.object_member_name
                {
                    let ctor = self.method_is_ctor;
                    self.after_function = false;
                    self.after_method_name = false;
                    self.method_is_ctor = false;
                    if ctor {
                        self.ctor_props.clear();
                        self.ctor_modifier_seen = false;
                    }
                    PKind::ParamsDecl { ctor }
                } else if self.prev_is_value() {
                    PKind::Call
                } else {
                    let control = self.after_control;
                    self.after_control = false;
                    PKind::Group { control }
                };
                self.object_member_name = false;
                self.push_frame(FKind::Paren(kind));
                self.emit_token();
                self.prev = Prev::Punct("(".to_string());
                self.stmt_start = false;
            }
            ")" => {
                let closed = match self.frames.pop() {
                    Some(Frame {
                        kind: FKind::Paren(k),
                        ..
                    }) => k,
                    _ => return Err(self.diag(i, "unbalanced ')'")),
                };
                if closed == (PKind::ParamsDecl { ctor: true }) {
                    self.pending_ctor_props = std::mem::take(&mut self.ctor_props);
                }
                self.emit_token();
                self.prev = Prev::CloseParen(closed);
                if matches!(closed, PKind::Group { control: true }) {
                    self.stmt_start = true;
                }
            }
            "{" => {
                let kind = self.classify_brace();
                if matches!(kind, FKind::ClassBody { .. }) {
                    self.class_pending = false;
                }
                let inject = matches!(self.prev, Prev::CloseParen(PKind::ParamsDecl { ctor: true }))
                    && !self.pending_ctor_props.is_empty();
                if inject && self.nearest_class_has_extends() {
                    return Err(self.diag(
                        i,
                        "parameter properties in a derived class are not supported",
                    ));
                }
                let block_like = matches!(kind, FKind::Block | FKind::ClassBody { .. });
                self.push_frame(kind);
                self.emit_token();
                if inject {
                    for prop in std::mem::take(&mut self.pending_ctor_props) {
                        self.out
                            .push_str(&format!("\n        this.{prop} = {prop};"));
                    }
                }
                if block_like {
                    self.after_statement();
                } else {
                    self.prev = Prev::Punct("{".to_string());
                    self.stmt_start = false;
                }
            }
            "}" => {
                if self.frames.len() <= 1 {
                    return Err(self.diag(i, "unbalanced '}'"));
                }
                let closed = self.frames.pop().expect("checked");
                self.emit_token();
                if matches!(closed.kind, FKind::Object) {
                    self.prev = Prev::Value;
                    self.vd_pattern_closed();
                } else {
                    self.prev = Prev::BlockClose;
                    self.stmt_start = true;
                    self.vd = None;
                    // A method body just ended: back to member heads.
                    self.set_member_start(true);
                }
            }
            "[" => {
                self.push_frame(FKind::Bracket);
                self.emit_token();
                self.prev = Prev::Punct("[".to_string());
                self.stmt_start = false;
            }
            "]" => {
                if self.frames.len() <= 1
                    || !matches!(self.cur_frame_kind(), FKind::Bracket)
                {
                    return Err(self.diag(i, "unbalanced ']'"));
                }
                self.frames.pop();
                self.emit_token();
                self.prev = Prev::Value;
                self.vd_pattern_closed();
            }
            ";" => {
                self.emit_token();
                self.after_statement();
                self.vd = None;
                self.frame().ternary = 0;
                self.set_member_start(true);
            }
            ":" => self.on_colon(),
            "?" => self.on_question(),
            "!" => {
                if self.prev_is_value() {
                    // Non-null / definite-assignment assertion.
                    self.skip_through(i);
                } else {
                    self.emit_token();
                    self.prev = Prev::Punct("!".to_string());
                    self.stmt_start = false;
                }
            }
            "<" => self.on_angle(),
            "@" => return Err(self.diag(i, "decorators are not supported")),
            "," => {
                if let Some(vd) = &mut self.vd {
                    if vd.depth == self.frames.len() {
                        vd.awaiting_name = true;
                        vd.awaiting_ann = false;
                    }
                }
                self.ctor_modifier_seen = false;
                self.emit_token();
                self.prev = Prev::Punct(",".to_string());
            }
            "=" => {
                if let Some(vd) = &mut self.vd {
                    if vd.depth == self.frames.len() {
                        vd.awaiting_ann = false;
                    }
                }
                self.emit_token();
                self.prev = Prev::Punct("=".to_string());
                self.stmt_start = false;
            }
            _ => {
                self.emit_token();
                self.prev = Prev::Punct(p.to_string());
                self.stmt_start = false;
            }
        }
        Ok(())
    }

    fn on_colon(&mut self) {
        let i = self.i;

        // Ternary alternates and case labels bind before any annotation.
        if self.frame().ternary > 0 {
            self.frame().ternary -= 1;
            self.emit_token();
            self.prev = Prev::Punct(":".to_string());
            return;
        }
        if self.in_case {
            self.emit_token();
            self.after_statement();
            return;
        }

        // Variable declarator annotation: `const x: T = ...`.
        let vd_ann = self
            .vd
            .as_ref()
            .is_some_and(|vd| vd.awaiting_ann && vd.depth == self.frames.len());
        if vd_ann {
            self.erase_type(i, i + 1, false);
            return;
        }

        // Return type of a declared function or method.
        if matches!(self.prev, Prev::CloseParen(PKind::ParamsDecl { .. })) {
            self.erase_type(i, i + 1, false);
            return;
        }
        // Return type of an arrow candidate: the `=>` must survive.
        if matches!(self.prev, Prev::CloseParen(PKind::Group { .. })) {
            self.erase_type(i, i + 1, true);
            return;
        }

        let strippable = match self.cur_frame_kind() {
            FKind::Paren(PKind::ParamsDecl { .. }) => true,
            FKind::Paren(PKind::Group { .. }) | FKind::ClassBody { .. } => {
                matches!(self.prev, Prev::Ident(_) | Prev::Value)
            }
            _ => false,
        };
        if strippable {
            self.erase_type(i, i + 1, false);
            return;
        }

        // Object literal colon, label, pattern rename.
        self.emit_token();
        self.prev = Prev::Punct(":".to_string());
        self.stmt_start = false;
    }

    fn on_question(&mut self) {
        let i = self.i;
        let next = self.sig_text(i + 1);
        if next == Some(":") {
            // Optional marker directly before an annotation.
            self.skip_through(i);
            return;
        }
        if matches!(next, Some(")" | ","))
            && matches!(
                self.cur_frame_kind(),
                FKind::Paren(PKind::ParamsDecl { .. })
            )
        {
            // Optional parameter without an annotation.
            self.skip_through(i);
            return;
        }
        self.frame().ternary += 1;
        self.emit_token();
        self.prev = Prev::Punct("?".to_string());
        self.stmt_start = false;
    }

    /// `<` opens a generic parameter/argument list when the bracket run
    /// is type-shaped and the context says so; otherwise a comparison.
    fn on_angle(&mut self) {
        let i = self.i;
        let decl_context = self.after_function
            || self.after_method_name
            || self.class_pending
            || matches!(&self.prev, Prev::Ident(s) if s == "function" || s == "class");
        let expr_candidate = matches!(self.prev, Prev::Ident(_)) || self.prev_punct("=");
        if decl_context || expr_candidate {
            if let Some(j) = self.try_generic_end(i) {
                if decl_context || self.sig_text(j + 1) == Some("(") {
                    self.skip_through(j);
                    return;
                }
            }
        }
        self.emit_token();
        self.prev = Prev::Punct("<".to_string());
        self.stmt_start = false;
    }

    // ---- classification helpers --------------------------------------

    fn classify_brace(&self) -> FKind {
        if self.class_pending {
            return FKind::ClassBody {
                member_start: true,
                has_extends: self.class_pending_extends,
            };
        }
        if self.stmt_start {
            return FKind::Block;
        }
        match &self.prev {
            Prev::None | Prev::BlockClose => FKind::Block,
            Prev::CloseParen(PKind::ParamsDecl { .. } | PKind::Group { control: true }) => {
                FKind::Block
            }
            Prev::Punct(p) if p == "=>" => FKind::Block,
            Prev::Ident(s) if matches!(s.as_str(), "else" | "do" | "try" | "finally") => {
                FKind::Block
            }
            _ => FKind::Object,
        }
    }

    fn nearest_class_has_extends(&self) -> bool {
        for f in self.frames.iter().rev() {
            if let FKind::ClassBody { has_extends, .. } = f.kind {
                return has_extends;
            }
        }
        false
    }

    fn at_param_name_position(&self) -> bool {
        self.prev_punct("(") || self.prev_punct(",")
    }

    fn next_is_ident(&self, i: usize) -> bool {
        self.sig(i + 1)
            .is_some_and(|j| self.toks[j].kind == TokenKind::Ident)
    }

    fn is_type_alias(&self, i: usize) -> bool {
        let Some(j) = self.sig(i + 1) else {
            return false;
        };
        if self.toks[j].kind != TokenKind::Ident {
            return false;
        }
        matches!(self.sig_text(j + 1), Some("=" | "<"))
    }

    fn is_import_statement(&self, i: usize) -> bool {
        // `import(...)` and `import.meta` are expressions and stay.
        !matches!(self.sig_text(i + 1), Some("(" | "."))
    }

    fn looks_like_namespace(&self, i: usize) -> bool {
        self.sig(i + 1).is_some_and(|j| {
            matches!(self.toks[j].kind, TokenKind::Ident | TokenKind::Str)
                && self.sig_text(j + 1) == Some("{")
        })
    }

    // ---- type skipping ------------------------------------------------

    /// Consume a type expression starting at token `from`. Returns the
    /// index just past the last consumed token (`from` itself when the
    /// type is empty). With `arrow_stop`, a top-level `=>` terminates the
    /// type (arrow-function return annotation); otherwise `=>` continues
    /// it (function types).
    #[allow(clippy::too_many_lines)]
    fn skip_type(&self, from: usize, arrow_stop: bool) -> usize {
        let mut k = from;
        let mut depth: i32 = 0;
        let mut expect_atom = true;
        while k < self.toks.len() {
            let t = &self.toks[k];
            if t.is_comment() {
                k += 1;
                continue;
            }
            let text = t.text(self.src);
            if depth > 0 {
                match text {
                    "(" | "[" | "{" | "<" => depth += 1,
                    ")" | "]" | "}" | ">" => {
                        depth -= 1;
                        if depth == 0 {
                            expect_atom = false;
                        }
                    }
                    _ => {}
                }
                k += 1;
                continue;
            }
            match t.kind {
                TokenKind::Ident => {
                    let prefix_op = matches!(
                        text,
                        "typeof" | "keyof" | "readonly" | "infer" | "new" | "unique" | "import"
                    );
                    if expect_atom {
                        if !prefix_op {
                            expect_atom = false;
                        }
                        k += 1;
                    } else if matches!(text, "extends" | "in") {
                        expect_atom = true;
                        k += 1;
                    } else {
                        break;
                    }
                }
                TokenKind::Str | TokenKind::Number | TokenKind::Template => {
                    if expect_atom {
                        expect_atom = false;
                        k += 1;
                    } else {
                        break;
                    }
                }
                _ => match text {
                    "|" | "&" | "." => {
                        expect_atom = true;
                        k += 1;
                    }
                    "=>" => {
                        if arrow_stop && !expect_atom {
                            break;
                        }
                        expect_atom = true;
                        k += 1;
                    }
                    "[" | "<" => {
                        // Postfix index/array/generic, or a bracketed atom.
                        depth += 1;
                        k += 1;
                    }
                    "(" | "{" => {
                        if expect_atom {
                            depth += 1;
                            k += 1;
                        } else {
                            break;
                        }
                    }
                    "..." | "-" if expect_atom => k += 1,
                    _ => break,
                },
            }
        }
        k
    }

    /// Lookahead: does `<` at `i` open a type-shaped bracket run?
    /// Returns the index of the matching `>`.
    fn try_generic_end(&self, i: usize) -> Option<usize> {
        let mut angle: i32 = 0;
        let mut round: i32 = 0;
        let mut square: i32 = 0;
        let mut curly: i32 = 0;
        let mut k = i;
        let mut steps = 0;
        while let Some(t) = self.toks.get(k) {
            steps += 1;
            if steps > 256 {
                return None;
            }
            if t.is_comment() {
                k += 1;
                continue;
            }
            let text = t.text(self.src);
            match t.kind {
                TokenKind::Ident | TokenKind::Str | TokenKind::Number | TokenKind::Template => {}
                _ => match text {
                    "<" => angle += 1,
                    ">" => {
                        angle -= 1;
                        if angle == 0 {
                            return (round == 0 && square == 0 && curly == 0).then_some(k);
                        }
                    }
                    "(" => round += 1,
                    ")" => {
                        round -= 1;
                        if round < 0 {
                            return None;
                        }
                    }
                    "[" => square += 1,
                    "]" => {
                        square -= 1;
                        if square < 0 {
                            return None;
                        }
                    }
                    "{" => curly += 1,
                    "}" => {
                        curly -= 1;
                        if curly < 0 {
                            return None;
                        }
                    }
                    "," | "." | "|" | "&" | "=>" | "?" | ":" | "=" | "..." | "-" => {}
                    _ => return None,
                },
            }
            k += 1;
        }
        None
    }

    /// Last token before a `{` at bracket depth zero.
    fn scan_until_brace(&self, from: usize) -> usize {
        let mut depth: i32 = 0;
        let mut k = from + 1;
        let mut last = from;
        while let Some(t) = self.toks.get(k) {
            if t.is_comment() {
                k += 1;
                continue;
            }
            match t.text(self.src) {
                "{" if depth == 0 => break,
                "(" | "[" | "<" | "{" => depth += 1,
                ")" | "]" | ">" | "}" => depth -= 1,
                _ => {}
            }
            last = k;
            k += 1;
        }
        last
    }

    // ---- statement-level skips ---------------------------------------

    fn skip_interface(&mut self, i: usize) -> Result<(), Diagnostic> {
        // Header: name, generics, extends clause, up to the body brace.
        let mut depth: i32 = 0;
        let mut k = i + 1;
        loop {
            let Some(t) = self.toks.get(k) else {
                return Err(self.diag(i, "unterminated interface declaration"));
            };
            if t.is_comment() {
                k += 1;
                continue;
            }
            match t.text(self.src) {
                "{" if depth == 0 => break,
                "(" | "[" | "<" => depth += 1,
                ")" | "]" | ">" => depth -= 1,
                _ => {}
            }
            k += 1;
        }
        // Body: balanced braces.
        let mut braces: i32 = 0;
        while let Some(t) = self.toks.get(k) {
            match t.text(self.src) {
                "{" => braces += 1,
                "}" => {
                    braces -= 1;
                    if braces == 0 {
                        self.skip_through(k);
                        self.after_statement();
                        return Ok(());
                    }
                }
                _ => {}
            }
            k += 1;
        }
        Err(self.diag(i, "unterminated interface declaration"))
    }

    fn skip_type_alias(&mut self, i: usize) -> Result<(), Diagnostic> {
        // `type` Name [<...>] `=` Type [;]
        let name = self
            .sig(i + 1)
            .ok_or_else(|| self.diag(i, "incomplete type alias"))?;
        let mut k = name + 1;
        if self.sig_text(k) == Some("<") {
            let mut angle: i32 = 0;
            let mut m = self.sig(k).expect("checked");
            loop {
                let Some(t) = self.toks.get(m) else {
                    return Err(self.diag(i, "unterminated type alias"));
                };
                match t.text(self.src) {
                    "<" => angle += 1,
                    ">" => {
                        angle -= 1;
                        if angle == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                m += 1;
            }
            k = m + 1;
        }
        let eq = self
            .sig(k)
            .ok_or_else(|| self.diag(i, "incomplete type alias"))?;
        if self.text(eq) != "=" {
            return Err(self.diag(eq, "malformed type alias"));
        }
        let end = self.skip_type(eq + 1, false);
        let mut last = end.saturating_sub(1).max(eq);
        // Swallow an immediately following semicolon.
        if self.toks.get(end).is_some_and(|t| t.text(self.src) == ";") {
            last = end;
        }
        self.skip_through(last);
        self.after_statement();
        Ok(())
    }

    fn skip_declare(&mut self, i: usize) -> Result<(), Diagnostic> {
        let mut depth: i32 = 0;
        let mut k = i + 1;
        let mut consumed = 0usize;
        let mut last = i;
        while let Some(t) = self.toks.get(k) {
            if t.is_comment() {
                k += 1;
                continue;
            }
            if depth == 0 && consumed >= 2 && self.preceded_by_newline(k) {
                break;
            }
            match t.text(self.src) {
                "(" | "[" | "<" | "{" => depth += 1,
                ")" | "]" | ">" => depth -= 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        last = k;
                        break;
                    }
                }
                ";" if depth == 0 => {
                    last = k;
                    break;
                }
                _ => {}
            }
            last = k;
            consumed += 1;
            k += 1;
        }
        self.skip_through(last);
        self.after_statement();
        Ok(())
    }

    // ---- module lowering ----------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn lower_import(&mut self, i: usize) -> Result<(), Diagnostic> {
        self.uses_modules = true;
        let mut k = self
            .sig(i + 1)
            .ok_or_else(|| self.diag(i, "incomplete import"))?;

        // Side-effect import: `import 'mod';`
        if self.toks[k].kind == TokenKind::Str {
            let module = self.text(k).to_string();
            self.replace_through(k, &format!("require({module})"));
            self.after_statement();
            return Ok(());
        }

        // Type-only import vanishes entirely.
        if self.text(k) == "type" && self.sig_text(k + 1) != Some("from") {
            let end = self.find_import_source(k)?;
            self.skip_through(end);
            self.after_statement();
            return Ok(());
        }

        let mut default_binding: Option<String> = None;
        let mut namespace_binding: Option<String> = None;
        let mut named: Vec<(String, String)> = Vec::new();

        if self.toks[k].kind == TokenKind::Ident && self.text(k) != "from" {
            default_binding = Some(self.text(k).to_string());
            k = self.next_sig(k)?;
            if self.text(k) == "," {
                k = self.next_sig(k)?;
            }
        }
        if self.text(k) == "*" {
            let as_kw = self.next_sig(k)?;
            if self.text(as_kw) != "as" {
                return Err(self.diag(as_kw, "malformed namespace import"));
            }
            let name = self.next_sig(as_kw)?;
            namespace_binding = Some(self.text(name).to_string());
            k = self.next_sig(name)?;
        } else if self.text(k) == "{" {
            k = self.next_sig(k)?;
            while self.text(k) != "}" {
                if self.text(k) == "type" && !matches!(self.sig_text(k + 1), Some("," | "}" | "as" | "from")) {
                    // `import { type T }` specifier: drop it.
                    k = self.next_sig(k)?;
                    if self.sig_text(k + 1) == Some("as") {
                        let a = self.sig(k + 1).expect("checked");
                        k = self.next_sig(a)?;
                    }
                } else {
                    let imported = self.text(k).to_string();
                    let mut local = imported.clone();
                    if self.sig_text(k + 1) == Some("as") {
                        let a = self.sig(k + 1).expect("checked");
                        let l = self.next_sig(a)?;
                        local = self.text(l).to_string();
                        k = l;
                    }
                    named.push((imported, local));
                }
                k = self.next_sig(k)?;
                if self.text(k) == "," {
                    k = self.next_sig(k)?;
                }
            }
            k = self.next_sig(k)?;
        }

        if self.text(k) != "from" {
            return Err(self.diag(k, "malformed import statement"));
        }
        let src_tok = self.next_sig(k)?;
        if self.toks[src_tok].kind != TokenKind::Str {
            return Err(self.diag(src_tok, "import source must be a string literal"));
        }
        let module = self.text(src_tok).to_string();

        let mut parts: Vec<String> = Vec::new();
        if let Some(d) = default_binding {
            parts.push(format!("const {d} = require({module}).default;"));
        }
        if let Some(ns) = namespace_binding {
            parts.push(format!("const {ns} = require({module});"));
        }
        if !named.is_empty() {
            let list = named
                .iter()
                .map(|(imported, local)| {
                    if imported == local {
                        imported.clone()
                    } else {
                        format!("{imported}: {local}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("const {{ {list} }} = require({module});"));
        }
        if parts.is_empty() {
            parts.push(format!("require({module});"));
        }
        let mut text = parts.join(" ");
        // The source `;` (if any) survives on its own; avoid doubling.
        if self.sig_text(src_tok + 1) == Some(";") {
            while text.ends_with(';') {
                text.pop();
            }
        }
        self.replace_through(src_tok, &text);
        self.after_statement();
        Ok(())
    }

    fn next_sig(&self, after: usize) -> Result<usize, Diagnostic> {
        self.sig(after + 1)
            .ok_or_else(|| self.diag(after, "unexpected end of input"))
    }

    /// For a type-only import, find the module string token index.
    fn find_import_source(&self, from: usize) -> Result<usize, Diagnostic> {
        let mut k = from;
        while let Some(t) = self.toks.get(k) {
            if t.kind == TokenKind::Str {
                return Ok(k);
            }
            k += 1;
        }
        Err(self.diag(from, "incomplete import"))
    }

    fn on_export(&mut self, i: usize) -> Result<(), Diagnostic> {
        self.uses_modules = true;
        let j = self
            .sig(i + 1)
            .ok_or_else(|| self.diag(i, "incomplete export"))?;
        match self.text(j) {
            "default" => {
                self.replace_through(j, "exports.default =");
                self.prev = Prev::Punct("=".to_string());
                self.stmt_start = false;
                Ok(())
            }
            "*" => Err(self.diag(j, "re-export statements are not supported")),
            "{" => self.lower_export_list(j),
            "interface" | "type" | "declare" => {
                // Type-only declaration: drop `export`, the statement
                // handlers erase the rest.
                self.skip_through(i);
                self.stmt_start = true;
                Ok(())
            }
            "enum" => {
                self.skip_through(i);
                self.stmt_start = true;
                let start = self
                    .sig(self.i)
                    .ok_or_else(|| self.diag(self.i, "incomplete export"))?;
                self.lower_enum(start, true)
            }
            "function" | "class" | "const" | "let" | "var" | "async" | "abstract" => {
                self.replace_through(i, "");
                self.stmt_start = true;
                self.export_capture = true;
                Ok(())
            }
            _ => Err(self.diag(j, "unsupported export form")),
        }
    }

    /// `export { a, b as c };` becomes trailing `exports.*` assignments.
    fn lower_export_list(&mut self, open: usize) -> Result<(), Diagnostic> {
        let mut k = self.next_sig(open)?;
        let mut pairs: Vec<(String, String)> = Vec::new();
        while self.text(k) != "}" {
            if self.text(k) == "type" && !matches!(self.sig_text(k + 1), Some("," | "}" | "as")) {
                k = self.next_sig(k)?;
                if self.sig_text(k + 1) == Some("as") {
                    let a = self.sig(k + 1).expect("checked");
                    k = self.next_sig(a)?;
                }
            } else {
                let local = self.text(k).to_string();
                let mut exported = local.clone();
                if self.sig_text(k + 1) == Some("as") {
                    let a = self.sig(k + 1).expect("checked");
                    let e = self.next_sig(a)?;
                    exported = self.text(e).to_string();
                    k = e;
                }
                pairs.push((exported, local));
            }
            k = self.next_sig(k)?;
            if self.text(k) == "," {
                k = self.next_sig(k)?;
            }
        }
        if self.sig_text(k + 1) == Some("from") {
            return Err(self.diag(k, "re-export statements are not supported"));
        }
        self.exports.extend(pairs);
        self.skip_through(k);
        self.after_statement();
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn lower_enum(&mut self, i: usize, export: bool) -> Result<(), Diagnostic> {
        self.export_capture = false;
        // [`const`] `enum` Name `{` members `}`
        let mut k = i;
        if self.text(k) == "const" {
            k = self.next_sig(k)?;
        }
        let name_tok = self.next_sig(k)?;
        if self.toks[name_tok].kind != TokenKind::Ident {
            return Err(self.diag(name_tok, "malformed enum declaration"));
        }
        let name = self.text(name_tok).to_string();
        let open = self.next_sig(name_tok)?;
        if self.text(open) != "{" {
            return Err(self.diag(open, "malformed enum declaration"));
        }

        let mut body = String::new();
        let mut counter: Option<i64> = Some(0);
        let mut k = self.next_sig(open)?;
        while self.text(k) != "}" {
            // Member name: identifier or string literal.
            let member = match self.toks[k].kind {
                TokenKind::Ident => format!("\"{}\"", self.text(k)),
                TokenKind::Str => self.text(k).to_string(),
                _ => return Err(self.diag(k, "malformed enum member")),
            };
            let value;
            let mut is_string = false;
            let mut next = self.next_sig(k)?;
            if self.text(next) == "=" {
                let mut v = self.next_sig(next)?;
                let mut neg = false;
                if self.text(v) == "-" {
                    neg = true;
                    v = self.next_sig(v)?;
                }
                match self.toks[v].kind {
                    TokenKind::Number => {
                        let parsed = parse_int_literal(self.text(v)).ok_or_else(|| {
                            self.diag(v, "enum initializers must be integer or string literals")
                        })?;
                        let n = if neg { -parsed } else { parsed };
                        value = n.to_string();
                        counter = Some(n + 1);
                    }
                    TokenKind::Str if !neg => {
                        value = self.text(v).to_string();
                        is_string = true;
                        counter = None;
                    }
                    _ => {
                        return Err(
                            self.diag(v, "enum initializers must be integer or string literals")
                        )
                    }
                }
                next = self.next_sig(v)?;
            } else if let Some(c) = counter {
                value = c.to_string();
                counter = Some(c + 1);
            } else {
                return Err(self.diag(k, "enum member needs an initializer after a string member"));
            }

            if is_string {
                body.push_str(&format!("    {name}[{member}] = {value};\n"));
            } else {
                body.push_str(&format!(
                    "    {name}[{name}[{member}] = {value}] = {member};\n"
                ));
            }

            match self.text(next) {
                "," => k = self.next_sig(next)?,
                "}" => k = next,
                _ => return Err(self.diag(next, "malformed enum member")),
            }
        }

        let lowered =
            format!("var {name};\n(function ({name}) {{\n{body}}})({name} || ({name} = {{}}));");
        self.replace_through(k, &lowered);
        self.after_statement();
        if export {
            self.exports.push((name.clone(), name));
        }
        Ok(())
    }
}

/// Parse a decimal or `0x`/`0o`/`0b` integer literal.
fn parse_int_literal(raw: &str) -> Option<i64> {
    let clean = raw.replace('_', "");
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = clean.strip_prefix(prefix) {
            return i64::from_str_radix(digits, radix).ok();
        }
    }
    clean.parse().ok()
}
