use super::template::{escape_html, Template};

/// Month picker that submits to `/payslip`
pub fn select_page(employee_uuid: &str, months: &[String]) -> String {
    let options: String = months
        .iter()
        .map(|m| {
            let m = escape_html(m);
            format!(r#"<option value="{m}">{m}</option>"#)
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head><meta charset="utf-8"><title>給与明細の月を選択</title></head>
<body>
  <h1>給与明細の月を選択</h1>
  <form action="/payslip" method="GET">
    <input type="hidden" name="u" value="{uuid}" />
    <select name="month">
      {options}
    </select>
    <button type="submit">表示</button>
  </form>
  <p><a href="/auth/logout">ログアウト</a></p>
</body>
</html>"#,
        uuid = escape_html(employee_uuid),
        options = options,
    )
}

pub fn register_form(template: &Template, subject: &str, form_token: &str) -> String {
    template.render(&[
        ("userId", escape_html(subject)),
        ("csrfToken", escape_html(form_token)),
    ])
}

pub fn register_success_page() -> String {
    r#"<!DOCTYPE html>
<html lang="ja">
<head><meta charset="utf-8"><title>登録完了</title></head>
<body>
  <h1>✅ 登録が完了しました！</h1>
  <p>給与データが登録され次第、給与明細を確認できるようになります。</p>
  <a href="/">トップページに戻る</a>
</body>
</html>"#
        .to_string()
}
