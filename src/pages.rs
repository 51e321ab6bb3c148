//! Server-rendered HTML for account management.
//!
//! Every interpolated value passes through [`escape_html`].

// self
use crate::account::Account;

/// Message posted by the account list's test button.
pub const TEST_MESSAGE: &str = "THIS IS A TEST, PLEASE IGNORE!";

const TWITTER_FIELDS: [(&str, &str); 5] = [
	("apiKey", "API Key"),
	("apiKeySecret", "API Key Secret"),
	("bearerToken", "Bearer Token"),
	("accessToken", "Access Token"),
	("accessTokenSecret", "Access Token Secret"),
];

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(c),
		}
	}

	escaped
}

/// Renders the X credential form for one account.
///
/// The form submits `{"twitter": {handle, apiKey, ...}}` with `PUT ./<id>`.
pub fn account_config_form(name: &str, id: &str) -> String {
	let name = escape_html(name);
	let id = escape_html(id);
	let fields = TWITTER_FIELDS
		.iter()
		.map(|(field, label)| {
			format!(
				r#"      <div class="form-group">
        <label for="{field}">{label}</label>
        <input type="password" id="{field}" name="{field}">
      </div>
"#
			)
		})
		.collect::<String>();

	format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Configure {name} API Keys</title>
<style>
  body {{ font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; display: flex; justify-content: center; }}
  form {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }}
  h2 {{ text-align: center; }}
  fieldset {{ border: 2px solid #ccc; border-radius: 10px; padding: 10px; margin-bottom: 15px; }}
  legend {{ padding: 0 10px; font-size: larger; font-weight: bold; }}
  .form-group {{ margin-bottom: 15px; }}
  label {{ display: block; margin-bottom: 5px; }}
  input {{ padding: 10px; border: 1px solid #ccc; border-radius: 4px; }}
  input[type="password"], input[type="text"] {{ width: 90%; }}
  input[type="submit"] {{ width: 100%; background-color: #A238FF; color: white; border: none; cursor: pointer; margin-top: 20px; }}
  input[type="submit"]:hover {{ background-color: #250083; }}
</style>
</head>
<body>
  <form id="apiKeysForm">
    <h2>Configure {name} API Keys</h2>
    <fieldset>
      <legend>Twitter</legend>
      <p>You can register for a <a href="https://developer.twitter.com/en/portal/petition/essential/terms?plan=free">Twitter Developer account</a> to get the info required for this form.</p>
      <div class="form-group">
        <label for="handle">Handle</label>
        <input type="text" id="handle" name="handle">
      </div>
{fields}    </fieldset>
    <input type="submit" value="Submit" onclick="submitForm(event)">
  </form>
  <script>
    function submitForm(event) {{
      event.preventDefault();
      const formData = new FormData(document.getElementById('apiKeysForm'));
      const twitter = {{}};
      formData.forEach((value, key) => {{ if (value) twitter[key] = value; }});

      fetch('./{id}', {{
        method: 'PUT',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({{ twitter }})
      }})
      .then(() => {{ window.location.href = '/v1/accounts'; }})
      .catch((error) => {{
        console.error('Error:', error);
        alert('Error submitting form');
      }});
    }}
  </script>
</body>
</html>
"#
	)
}

/// Renders the account list with an add-account modal and per-account X test buttons.
pub fn accounts_page(accounts: &[Account]) -> String {
	let rows = accounts
		.iter()
		.map(|account| {
			let id = escape_html(&account.id);
			let name = escape_html(&account.name);

			format!(
				r#"      <tr>
        <td><a href="/v1/accounts/{id}">{name}</a></td>
        <td><button class="btn btn-primary test-button" data-account="{id}" onclick="testTwitter(this.dataset.account)">Test Twitter</button></td>
      </tr>
"#
			)
		})
		.collect::<String>();

	format!(
		r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Accounts List</title>
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/twitter-bootstrap/4.5.0/css/bootstrap.min.css">
<style>
  body {{ padding: 20px; }}
  .modal-content {{ padding: 20px; }}
  .add-button {{ margin-bottom: 10px; }}
  .test-button {{ margin-right: 10px; }}
</style>
</head>
<body>
  <h1>Accounts List</h1>
  <button type="button" class="btn btn-primary float-right add-button" data-toggle="modal" data-target="#addAccountModal">Add Account</button>
  <table class="table">
    <thead>
      <tr>
        <th>Account Name</th>
        <th>Actions</th>
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>

  <div class="modal fade" id="addAccountModal" tabindex="-1" role="dialog" aria-labelledby="addAccountModalLabel" aria-hidden="true">
    <div class="modal-dialog" role="document">
      <div class="modal-content">
        <div class="modal-header">
          <h5 class="modal-title" id="addAccountModalLabel">Add New Account</h5>
          <button type="button" class="close" data-dismiss="modal" aria-label="Close"><span aria-hidden="true">&times;</span></button>
        </div>
        <div class="modal-body">
          <form id="addAccountForm">
            <div class="form-group">
              <label for="accountId">Id</label>
              <input type="text" class="form-control" id="accountId" placeholder="Used in events to identify the account" required>
            </div>
            <div class="form-group">
              <label for="accountName">Name</label>
              <input type="text" class="form-control" id="accountName" placeholder="Friendly name" required>
            </div>
            <button type="button" class="btn btn-primary" onclick="addAccount(event)">Submit</button>
          </form>
        </div>
      </div>
    </div>
  </div>

  <script src="https://code.jquery.com/jquery-3.5.1.slim.min.js"></script>
  <script src="https://cdn.jsdelivr.net/npm/@popperjs/core@2.9.2/dist/umd/popper.min.js"></script>
  <script src="https://stackpath.bootstrapcdn.com/bootstrap/4.5.0/js/bootstrap.min.js"></script>
  <script>
    function addAccount(event) {{
      event.preventDefault();
      const id = document.getElementById('accountId').value;
      const name = document.getElementById('accountName').value;
      fetch('./accounts', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({{ id, name }})
      }})
      .then(response => response.json())
      .then(data => {{ window.location.href = '/v1/accounts/' + data.id; }})
      .catch(error => {{ console.error('Error:', error); }});
    }}
    function testTwitter(accountId) {{
      fetch('./accounts/' + encodeURIComponent(accountId) + '/messages', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({{ message: '{TEST_MESSAGE}', platform: 'twitter' }})
      }})
      .then(response => response.json())
      .then(data => {{ alert(data.url || data.message); }})
      .catch(error => {{ console.error('Error:', error); }});
    }}
  </script>
</body>
</html>
"##
	)
}
