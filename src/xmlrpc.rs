//! XML-RPC codec for the GLPI webservices endpoint.
//!
//! Values cross the codec as `serde_json::Value` so the parameter and result
//! schemas stay serde-driven:
//!
//! | JSON | XML-RPC |
//! |---|---|
//! | string | `<string>` |
//! | integer within `i32` | `<int>` |
//! | integer beyond `i32` | `<string>` with the decimal text |
//! | float | `<double>` |
//! | bool | `<boolean>` |
//! | array | `<array>` |
//! | object | `<struct>`, null members omitted |
//! | null | `<nil/>` |
//!
//! Decoding also accepts `<i4>`, `<i8>`, `<dateTime.iso8601>`, `<base64>`
//! (both kept as text) and untyped `<value>` text.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Map, Number, Value};

use crate::error::HelpdeskError;

const XML_DECL: &str = r#"<?xml version="1.0"?>"#;

/// Encodes a `<methodCall>` with a single parameter.
pub fn encode_call(method: &str, param: &Value) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str("<methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params><param>");
    write_value(&mut xml, param);
    xml.push_str("</param></params></methodCall>");
    xml
}

/// Encodes a successful `<methodResponse>`.
pub fn encode_response(result: &Value) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str("<methodResponse><params><param>");
    write_value(&mut xml, result);
    xml.push_str("</param></params></methodResponse>");
    xml
}

/// Encodes a `<fault>` response.
pub fn encode_fault(code: i64, message: &str) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str("<methodResponse><fault>");
    write_value(
        &mut xml,
        &json!({"faultCode": code, "faultString": message}),
    );
    xml.push_str("</fault></methodResponse>");
    xml
}

/// Decodes a `<methodResponse>` document.
///
/// # Errors
///
/// A `<fault>` answer becomes `HelpdeskError::Fault`; a document that is not
/// a well-formed response becomes `HelpdeskError::Xml` or `HelpdeskError::Protocol`.
pub fn decode_response(xml: &str) -> Result<Value, HelpdeskError> {
    let mut lexer = Lexer::new(xml);
    lexer.expect_open("methodResponse")?;

    match lexer.next_tag()? {
        Token::Open(tag) if tag == "params" => {
            lexer.expect_open("param")?;
            let result = lexer.value()?;
            lexer.expect_close("param")?;
            lexer.expect_close("params")?;
            lexer.expect_close("methodResponse")?;
            Ok(result)
        }
        Token::Open(tag) if tag == "fault" => {
            let fault = lexer.value()?;
            lexer.expect_close("fault")?;
            let code = fault.get("faultCode").and_then(Value::as_i64);
            let message = fault.get("faultString").and_then(Value::as_str);
            match code {
                Some(code) => Err(HelpdeskError::fault(code, message.unwrap_or_default())),
                None => Err(HelpdeskError::protocol("fault without an integer faultCode")),
            }
        }
        other => Err(unexpected("<params> or <fault>", &other)),
    }
}

/// Decodes a `<methodCall>` document into its method name and parameters.
///
/// # Errors
///
/// Returns `HelpdeskError::Xml` or `HelpdeskError::Protocol` on malformed input.
pub fn parse_call(xml: &str) -> Result<(String, Vec<Value>), HelpdeskError> {
    let mut lexer = Lexer::new(xml);
    lexer.expect_open("methodCall")?;
    lexer.expect_open("methodName")?;
    let method = lexer.text_until("methodName")?.trim().to_string();

    let mut params = Vec::new();
    match lexer.next_tag()? {
        Token::Empty(tag) if tag == "params" => {}
        Token::Open(tag) if tag == "params" => loop {
            match lexer.next_tag()? {
                Token::Open(tag) if tag == "param" => {
                    params.push(lexer.value()?);
                    lexer.expect_close("param")?;
                }
                Token::Close(tag) if tag == "params" => break,
                other => return Err(unexpected("<param> or </params>", &other)),
            }
        },
        Token::Close(tag) if tag == "methodCall" => return Ok((method, params)),
        other => return Err(unexpected("<params>", &other)),
    }
    lexer.expect_close("methodCall")?;
    Ok((method, params))
}

fn write_value(xml: &mut String, value: &Value) {
    xml.push_str("<value>");
    match value {
        Value::Null => xml.push_str("<nil/>"),
        Value::Bool(b) => write_scalar(xml, "boolean", if *b { "1" } else { "0" }),
        Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => write_scalar(xml, "int", &i.to_string()),
            None if n.is_f64() => write_scalar(xml, "double", &n.to_string()),
            None => write_scalar(xml, "string", &n.to_string()),
        },
        Value::String(s) => write_scalar(xml, "string", s),
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                write_value(xml, item);
            }
            xml.push_str("</data></array>");
        }
        Value::Object(map) => {
            xml.push_str("<struct>");
            for (name, member) in map.iter().filter(|(_, v)| !v.is_null()) {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                write_value(xml, member);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
    }
    xml.push_str("</value>");
}

fn write_scalar(xml: &mut String, tag: &str, text: &str) {
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escape(text));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push('>');
}

#[derive(Debug)]
enum Token {
    Open(String),
    Close(String),
    Empty(String),
    Text(String),
    Eof,
}

/// Pull lexer over quick-xml events that keeps only what XML-RPC needs.
struct Lexer<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Lexer<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn next_token(&mut self) -> Result<Token, HelpdeskError> {
        loop {
            let token = match self.reader.read_event()? {
                Event::Start(e) => Token::Open(tag_name(e.name().as_ref())),
                Event::End(e) => Token::Close(tag_name(e.name().as_ref())),
                Event::Empty(e) => Token::Empty(tag_name(e.name().as_ref())),
                Event::Text(e) => Token::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => Token::Eof,
                _ => continue,
            };
            return Ok(token);
        }
    }

    /// Next structural token; whitespace between elements is skipped.
    fn next_tag(&mut self) -> Result<Token, HelpdeskError> {
        loop {
            match self.next_token()? {
                Token::Text(text) if text.trim().is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    fn expect_open(&mut self, tag: &str) -> Result<(), HelpdeskError> {
        match self.next_tag()? {
            Token::Open(name) if name == tag => Ok(()),
            other => Err(unexpected(&format!("<{}>", tag), &other)),
        }
    }

    fn expect_close(&mut self, tag: &str) -> Result<(), HelpdeskError> {
        match self.next_tag()? {
            Token::Close(name) if name == tag => Ok(()),
            other => Err(unexpected(&format!("</{}>", tag), &other)),
        }
    }

    /// Collects text up to the closing `tag`.
    fn text_until(&mut self, tag: &str) -> Result<String, HelpdeskError> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Close(name) if name == tag => return Ok(text),
                other => return Err(unexpected(&format!("</{}>", tag), &other)),
            }
        }
    }

    fn value(&mut self) -> Result<Value, HelpdeskError> {
        match self.next_tag()? {
            Token::Open(tag) if tag == "value" => self.value_body(),
            Token::Empty(tag) if tag == "value" => Ok(Value::String(String::new())),
            other => Err(unexpected("<value>", &other)),
        }
    }

    /// Content of a `<value>` whose start tag was consumed.
    fn value_body(&mut self) -> Result<Value, HelpdeskError> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Close(tag) if tag == "value" => return Ok(Value::String(text)),
                Token::Open(kind) if text.trim().is_empty() => {
                    let value = self.typed(&kind)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                Token::Empty(kind) if text.trim().is_empty() => {
                    let value = empty_typed(&kind)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                other => return Err(unexpected("value content", &other)),
            }
        }
    }

    fn typed(&mut self, kind: &str) -> Result<Value, HelpdeskError> {
        match kind {
            "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(self.text_until(kind)?)),
            "int" | "i4" | "i8" => {
                let text = self.text_until(kind)?;
                let n: i64 = text
                    .trim()
                    .parse()
                    .map_err(|_| HelpdeskError::protocol(format!("invalid <{}> {:?}", kind, text)))?;
                Ok(Value::from(n))
            }
            "double" => {
                let text = self.text_until(kind)?;
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| HelpdeskError::protocol(format!("invalid <double> {:?}", text)))
            }
            "boolean" => {
                let text = self.text_until(kind)?;
                match text.trim() {
                    "1" => Ok(Value::Bool(true)),
                    "0" => Ok(Value::Bool(false)),
                    other => Err(HelpdeskError::protocol(format!("invalid <boolean> {:?}", other))),
                }
            }
            "nil" => {
                self.expect_close("nil")?;
                Ok(Value::Null)
            }
            "array" => self.array(),
            "struct" => self.structure(),
            other => Err(HelpdeskError::protocol(format!("unsupported type <{}>", other))),
        }
    }

    fn array(&mut self) -> Result<Value, HelpdeskError> {
        let mut items = Vec::new();
        match self.next_tag()? {
            Token::Empty(tag) if tag == "data" => {}
            Token::Open(tag) if tag == "data" => loop {
                match self.next_tag()? {
                    Token::Open(tag) if tag == "value" => items.push(self.value_body()?),
                    Token::Empty(tag) if tag == "value" => items.push(Value::String(String::new())),
                    Token::Close(tag) if tag == "data" => break,
                    other => return Err(unexpected("<value> or </data>", &other)),
                }
            },
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }

    fn structure(&mut self) -> Result<Value, HelpdeskError> {
        let mut map = Map::new();
        loop {
            match self.next_tag()? {
                Token::Open(tag) if tag == "member" => {
                    self.expect_open("name")?;
                    let name = self.text_until("name")?;
                    let value = self.value()?;
                    self.expect_close("member")?;
                    map.insert(name, value);
                }
                Token::Close(tag) if tag == "struct" => return Ok(Value::Object(map)),
                other => return Err(unexpected("<member> or </struct>", &other)),
            }
        }
    }
}

fn empty_typed(kind: &str) -> Result<Value, HelpdeskError> {
    match kind {
        "nil" => Ok(Value::Null),
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(String::new())),
        "struct" => Ok(Value::Object(Map::new())),
        "array" => Ok(Value::Array(Vec::new())),
        other => Err(HelpdeskError::protocol(format!("empty <{}/>", other))),
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn unexpected(expected: &str, found: &Token) -> HelpdeskError {
    HelpdeskError::protocol(format!("expected {}, found {:?}", expected, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_login_call() {
        let xml = encode_call(
            "glpi.doLogin",
            &json!({"login_name": "shinken", "login_password": "a<b"}),
        );
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0"?><methodCall><methodName>glpi.doLogin</methodName>"#,
                "<params><param><value><struct>",
                "<member><name>login_name</name><value><string>shinken</string></value></member>",
                "<member><name>login_password</name><value><string>a&lt;b</string></value></member>",
                "</struct></value></param></params></methodCall>"
            )
        );
    }

    #[test]
    fn test_encode_scalars() {
        let xml = encode_call(
            "glpi.listTickets",
            &json!({"limit": 50, "big": 5_000_000_000_i64, "ratio": 0.5, "flag": true, "status": null}),
        );
        assert!(xml.contains("<name>limit</name><value><int>50</int></value>"));
        assert!(xml.contains("<name>big</name><value><string>5000000000</string></value>"));
        assert!(xml.contains("<name>ratio</name><value><double>0.5</double></value>"));
        assert!(xml.contains("<name>flag</name><value><boolean>1</boolean></value>"));
        assert!(!xml.contains("status"));
    }

    #[test]
    fn test_decode_struct_response() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse>
  <params>
    <param>
      <value><struct>
        <member><name>id</name><value><i4>12</i4></value></member>
        <member><name>name</name><value>Disk &amp; CPU</value></member>
        <member><name>urgent</name><value><boolean>0</boolean></value></member>
        <member><name>ratio</name><value><double>1.5</double></value></member>
        <member><name>date</name><value><dateTime.iso8601>20240101T10:00:00</dateTime.iso8601></value></member>
        <member><name>closed</name><value><nil/></value></member>
        <member><name>tags</name><value><array><data>
          <value><string> a </string></value>
          <value><int>2</int></value>
        </data></array></value></member>
      </struct></value>
    </param>
  </params>
</methodResponse>"#;

        assert_eq!(
            decode_response(xml).unwrap(),
            json!({
                "id": 12,
                "name": "Disk & CPU",
                "urgent": false,
                "ratio": 1.5,
                "date": "20240101T10:00:00",
                "closed": null,
                "tags": [" a ", 2]
            })
        );
    }

    #[test]
    fn test_decode_empty_array_and_string() {
        let xml = encode_response(&json!([]));
        assert_eq!(decode_response(&xml).unwrap(), json!([]));

        let xml = "<methodResponse><params><param><value><string/></value></param></params></methodResponse>";
        assert_eq!(decode_response(xml).unwrap(), json!(""));
    }

    #[test]
    fn test_decode_fault() {
        let err = decode_response(&encode_fault(3, "Bad login or password")).unwrap_err();
        match err {
            HelpdeskError::Fault { code, message } => {
                assert_eq!(code, 3);
                assert_eq!(message, "Bad login or password");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_non_xmlrpc() {
        assert!(decode_response(r#"{"session": "abc"}"#).is_err());
        assert!(decode_response("<html><body>404</body></html>").is_err());
        assert!(decode_response(
            "<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>"
        )
        .is_err());
    }

    #[test]
    fn test_parse_call_reads_back_parameters() {
        let xml = encode_call("glpi.getTicket", &json!({"session": "s", "ticket": "007"}));
        let (method, params) = parse_call(&xml).unwrap();
        assert_eq!(method, "glpi.getTicket");
        assert_eq!(params, vec![json!({"session": "s", "ticket": "007"})]);
    }
}
