//! The 23 tree-construction insertion modes (§4.10).

/// One insertion mode in the tree constructor's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    /// Before anything has been seen; looking for a doctype.
    Initial,
    /// Looking for `<html>`.
    BeforeHtml,
    /// Looking for `<head>`.
    BeforeHead,
    /// Inside `<head>...</head>`.
    InHead,
    /// `<noscript>` nested directly in `<head>` (scripting disabled: treated
    /// as ordinary head content).
    InHeadNoscript,
    /// Between `</head>` and `<body>`.
    AfterHead,
    /// The main document body.
    InBody,
    /// Inside `<title>`/`<textarea>` (RCDATA) or `<script>`/`<style>`
    /// (RAWTEXT/script-data) content.
    Text,
    /// Inside `<table>`, outside any cell/caption/section.
    InTable,
    /// Inside `<table>`'s character-data-only contexts (rare: whitespace
    /// between table sections).
    InTableText,
    /// Inside `<caption>`.
    InCaption,
    /// Inside `<colgroup>`.
    InColumnGroup,
    /// Inside `<tbody>`/`<thead>`/`<tfoot>`.
    InTableBody,
    /// Inside `<tr>`.
    InRow,
    /// Inside `<td>`/`<th>`.
    InCell,
    /// Inside `<select>`, outside a table.
    InSelect,
    /// Inside `<select>` nested in a `<table>`.
    InSelectInTable,
    /// Inside a `<template>` element.
    InTemplate,
    /// After `</body>`.
    AfterBody,
    /// Inside `<frameset>`.
    InFrameset,
    /// After `</frameset>`.
    AfterFrameset,
    /// After the closing `</html>` that followed `</body>`.
    AfterAfterBody,
    /// After the closing `</html>` that followed `</frameset>`.
    AfterAfterFrameset,
}
