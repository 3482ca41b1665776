use std::collections::BTreeSet;

use crate::kv::KeyValue;

/// Funciones de usuario de un job. Tienen que ser deterministas: si una
/// tarea se ejecuta dos veces (reasignación por timeout) las dos salidas
/// deben ser idénticas byte a byte.
pub trait MapReduceApp: Send + Sync {
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue>;
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

/// Palabras = tramos máximos de caracteres alfanuméricos o '_'.
fn tokenize(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// WordCount clásico: (palabra, "1") y el reduce cuenta.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCount;

impl MapReduceApp for WordCount {
    fn map(&self, _filename: &str, contents: &str) -> Vec<KeyValue> {
        tokenize(contents).map(|w| KeyValue::new(w, "1")).collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.len().to_string()
    }
}

/// Índice invertido: para cada palabra, en qué archivos aparece.
#[derive(Debug, Default, Clone, Copy)]
pub struct Indexer;

impl MapReduceApp for Indexer {
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue> {
        let words: BTreeSet<&str> = tokenize(contents).collect();
        words
            .into_iter()
            .map(|w| KeyValue::new(w, filename))
            .collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let files: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let joined: Vec<&str> = files.into_iter().collect();
        format!("{} {}", joined.len(), joined.join(","))
    }
}

/// Aplicaciones incluidas, por nombre (`MR_APP`).
pub fn app_by_name(name: &str) -> Option<Box<dyn MapReduceApp>> {
    match name {
        "wordcount" | "wc" => Some(Box::new(WordCount)),
        "indexer" => Some(Box::new(Indexer)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordcount_map_emite_un_par_por_palabra() {
        let kvs = WordCount.map("a.txt", "foo bar\nfoo, baz!");
        let keys: Vec<&str> = kvs.iter().map(|kv| kv.key.as_str()).collect();

        assert_eq!(keys, vec!["foo", "bar", "foo", "baz"]);
        assert!(kvs.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn wordcount_map_de_texto_vacio_no_emite_nada() {
        assert!(WordCount.map("vacio.txt", "  \n\t ").is_empty());
    }

    #[test]
    fn wordcount_reduce_cuenta_valores() {
        let values = vec!["1".to_string(), "1".to_string(), "1".to_string()];
        assert_eq!(WordCount.reduce("foo", &values), "3");
    }

    #[test]
    fn indexer_emite_cada_palabra_una_vez_por_archivo() {
        let kvs = Indexer.map("b.txt", "hola hola mundo");
        assert_eq!(
            kvs,
            vec![KeyValue::new("hola", "b.txt"), KeyValue::new("mundo", "b.txt")]
        );
    }

    #[test]
    fn indexer_reduce_lista_archivos_ordenados_sin_repetir() {
        let values = vec![
            "b.txt".to_string(),
            "a.txt".to_string(),
            "b.txt".to_string(),
        ];
        assert_eq!(Indexer.reduce("hola", &values), "2 a.txt,b.txt");
    }

    #[test]
    fn app_by_name_reconoce_las_apps_incluidas() {
        assert!(app_by_name("wordcount").is_some());
        assert!(app_by_name("indexer").is_some());
        assert!(app_by_name("grep").is_none());
    }
}
